//! Authentication middleware and role guard.
//!
//! The gate runs on every protected subtree: it verifies the bearer token,
//! re-loads the account (tokens never self-certify account state), checks
//! the lock and session age, and inserts [`CurrentUser`] into request
//! extensions. Every rejection is logged with the client address and the
//! specific reason; the client sees one generic message, except for a
//! locked account which is distinguishable (423).

use axum::{
    async_trait,
    body::Body,
    extract::{FromRequestParts, State},
    http::{header::AUTHORIZATION, request::Parts, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::Utc;

use super::rate_limit::get_client_ip;
use crate::db::{Role, UserRepository};
use crate::web::error::ApiError;
use crate::web::handlers::AppState;

/// The authenticated account, inserted into request extensions by the gate.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    /// Account id.
    pub id: i64,
    /// Email address.
    pub email: String,
    /// Role.
    pub role: Role,
}

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or_else(|| ApiError::unauthorized("Authentication required"))
    }
}

fn bearer_token(req: &Request<Body>) -> Option<&str> {
    req.headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|header| header.strip_prefix("Bearer "))
}

/// Authentication gate for protected subtrees.
pub async fn auth_gate(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let ip = get_client_ip(&req);
    let now = Utc::now();

    let Some(token) = bearer_token(&req) else {
        tracing::debug!(ip = %ip, "Missing bearer token");
        return ApiError::unauthorized("Authentication required").into_response();
    };

    let claims = match state.tokens.verify(token) {
        Ok(claims) => claims,
        Err(e) => {
            tracing::warn!(ip = %ip, reason = %e, "Token rejected");
            return ApiError::unauthorized("Invalid or expired token").into_response();
        }
    };

    let Some(identity_id) = claims.identity_id() else {
        tracing::warn!(ip = %ip, sub = %claims.sub, "Malformed token subject");
        return ApiError::unauthorized("Invalid or expired token").into_response();
    };

    let repo = UserRepository::new(state.db.pool());
    let identity = match repo.get_by_id(identity_id).await {
        Ok(Some(identity)) => identity,
        Ok(None) => {
            tracing::warn!(ip = %ip, user_id = identity_id, "Token for unknown account");
            return ApiError::unauthorized("Invalid or expired token").into_response();
        }
        Err(e) => {
            tracing::error!(ip = %ip, error = %e, "Account lookup failed");
            return ApiError::internal("An internal error occurred").into_response();
        }
    };

    if !identity.is_active {
        tracing::warn!(ip = %ip, user_id = identity.id, "Deactivated account");
        return ApiError::unauthorized("Invalid or expired token").into_response();
    }

    if state.lockout.is_locked(
        identity.failed_attempts as u32,
        identity.locked_until,
        now,
    ) {
        tracing::warn!(ip = %ip, user_id = identity.id, "Locked account");
        return ApiError::account_locked("Account is temporarily locked").into_response();
    }

    if claims.session_age_exceeded(state.tokens.session_max_age(), now) {
        tracing::warn!(ip = %ip, user_id = identity.id, "Session exceeded maximum age");
        return ApiError::unauthorized("Invalid or expired token").into_response();
    }

    req.extensions_mut().insert(CurrentUser {
        id: identity.id,
        email: identity.email,
        role: identity.role,
    });

    next.run(req).await
}

/// Role guard for a route subtree. Runs after the gate.
pub async fn require_roles(
    allowed: &'static [Role],
    req: Request<Body>,
    next: Next,
) -> Response {
    match req.extensions().get::<CurrentUser>() {
        None => ApiError::unauthorized("Authentication required").into_response(),
        Some(user) if !allowed.contains(&user.role) => {
            tracing::warn!(
                user_id = user.id,
                role = %user.role,
                "Insufficient role for route"
            );
            ApiError::forbidden("Insufficient permissions").into_response()
        }
        Some(_) => next.run(req).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request_with_auth(value: &str) -> Request<Body> {
        Request::builder()
            .header(AUTHORIZATION, value)
            .body(Body::empty())
            .unwrap()
    }

    #[test]
    fn test_bearer_token_extraction() {
        let req = request_with_auth("Bearer abc.def.ghi");
        assert_eq!(bearer_token(&req), Some("abc.def.ghi"));
    }

    #[test]
    fn test_bearer_token_wrong_scheme() {
        let req = request_with_auth("Basic dXNlcjpwdw==");
        assert_eq!(bearer_token(&req), None);
    }

    #[test]
    fn test_bearer_token_missing() {
        let req = Request::builder().body(Body::empty()).unwrap();
        assert_eq!(bearer_token(&req), None);
    }
}
