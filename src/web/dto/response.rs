//! Response DTOs for the mugshop API.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::db::{Identity, Role};

/// Public view of an account. Never includes the password hash or the
/// lockout bookkeeping columns.
#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub phone: Option<String>,
    pub role: Role,
    pub is_active: bool,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<&Identity> for UserResponse {
    fn from(identity: &Identity) -> Self {
        Self {
            id: identity.id,
            email: identity.email.clone(),
            name: identity.name.clone(),
            phone: identity.phone.clone(),
            role: identity.role,
            is_active: identity.is_active,
            last_login: identity.last_login,
            created_at: identity.created_at,
        }
    }
}

/// Successful login response.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    /// Bearer token for subsequent requests.
    pub token: String,
    /// Token lifetime in seconds.
    pub expires_in: i64,
    /// The authenticated account.
    pub user: UserResponse,
}

/// Generic paginated list envelope.
#[derive(Debug, Serialize)]
pub struct ListResponse<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}

/// Simple message response.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

impl HealthResponse {
    pub fn ok() -> Self {
        Self {
            status: "ok",
            version: env!("CARGO_PKG_VERSION"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity() -> Identity {
        Identity {
            id: 1,
            email: "a@mugshop.com".to_string(),
            password: "$argon2id$secret".to_string(),
            name: "A".to_string(),
            phone: None,
            role: Role::Staff,
            failed_attempts: 3,
            last_failed_at: None,
            locked_until: None,
            last_login: None,
            created_at: Utc::now(),
            is_active: true,
        }
    }

    #[test]
    fn test_user_response_omits_password() {
        let response = UserResponse::from(&identity());
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["email"], "a@mugshop.com");
        assert_eq!(json["role"], "staff");
        assert!(json.get("password").is_none());
        assert!(json.get("failed_attempts").is_none());
        assert!(json.get("locked_until").is_none());
    }

    #[test]
    fn test_health_response() {
        let json = serde_json::to_value(HealthResponse::ok()).unwrap();
        assert_eq!(json["status"], "ok");
        assert!(json["version"].is_string());
    }
}
