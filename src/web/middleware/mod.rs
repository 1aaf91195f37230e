//! Middleware for the mugshop API.

pub mod audit;
pub mod auth;
pub mod cors;
pub mod rate_limit;
pub mod security;

pub use audit::audit_trail;
pub use auth::{auth_gate, require_roles, CurrentUser};
pub use cors::create_cors_layer;
pub use rate_limit::{get_client_ip, rate_limit, FixedWindowLimiter, RateLimitState};
pub use security::security_headers;
