//! HTTP handlers for the mugshop API.

pub mod audit;
pub mod auth;
pub mod order;
pub mod product;
pub mod user;

use std::sync::Arc;

use axum::Json;

use crate::audit::AuditStore;
use crate::auth::{LockoutPolicy, TokenIssuer};
use crate::config::PasswordPolicyConfig;
use crate::db::Database;
use crate::web::dto::HealthResponse;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Database handle.
    pub db: Arc<Database>,
    /// Token issuer/verifier.
    pub tokens: Arc<TokenIssuer>,
    /// Account lockout policy.
    pub lockout: Arc<LockoutPolicy>,
    /// Password policy for registration and password changes.
    pub password_policy: Arc<PasswordPolicyConfig>,
    /// Audit trail store.
    pub audit: Arc<dyn AuditStore>,
    /// Whether audit recording is enabled.
    pub audit_enabled: bool,
}

/// `GET /health`
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}
