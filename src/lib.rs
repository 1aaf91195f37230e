//! mugshop - backend for a small mugs-and-drinkware storefront.
//!
//! A public catalog and checkout API with a hardened back-office: JWT
//! sessions, account lockout, fixed-window rate limiting, role-based
//! route guarding, and an audit trail of admin actions.

pub mod audit;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod web;

pub use audit::{AuditEntry, AuditFilter, AuditStore, MemoryAuditStore};
pub use auth::{
    hash_password, validate_password, verify_password, Claims, LockState, LockoutPolicy,
    PasswordError, TokenError, TokenIssuer,
};
pub use config::Config;
pub use db::{
    Database, Identity, IdentityUpdate, NewIdentity, Order, OrderRepository, OrderStatus, Product,
    ProductRepository, Role, UserRepository,
};
pub use error::{Result, ShopError};
pub use web::{create_router, serve, ApiError, AppState, ErrorCode};
