//! Authentication building blocks: password hashing, account lockout,
//! and token issuance.

pub mod lockout;
pub mod password;
pub mod token;

pub use lockout::{LockState, LockoutPolicy};
pub use password::{hash_password, validate_password, verify_password, PasswordError};
pub use token::{Claims, TokenError, TokenIssuer};
