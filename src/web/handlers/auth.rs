//! Authentication handlers: login, registration, and account self-service.

use axum::{extract::State, http::HeaderMap, Json};
use chrono::Utc;
use std::collections::HashMap;

use crate::auth::{hash_password, validate_password, verify_password};
use crate::db::{IdentityUpdate, NewIdentity, UserRepository};
use crate::web::dto::{
    ChangePasswordRequest, LoginRequest, LoginResponse, MessageResponse, RegisterRequest,
    UpdateProfileRequest, UserResponse, ValidatedJson,
};
use crate::web::error::ApiError;
use crate::web::middleware::auth::CurrentUser;
use crate::web::middleware::rate_limit::client_ip_from_headers;

use super::AppState;

/// The one message every credential failure collapses to. The specific
/// cause goes to the server log only.
const GENERIC_LOGIN_ERROR: &str = "Invalid email or password";

fn client_ip(headers: &HeaderMap) -> String {
    client_ip_from_headers(headers).unwrap_or_else(|| "unknown".to_string())
}

fn password_policy_error(message: String) -> ApiError {
    let mut details = HashMap::new();
    details.insert("password".to_string(), vec![message]);
    ApiError::validation(details)
}

/// `POST /api/auth/login`
///
/// Drives the lockout machine: a locked account is rejected with 423
/// without counting, a failure increments the counter (and may take the
/// lock), a success resets it and issues a token.
pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    ValidatedJson(request): ValidatedJson<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let now = Utc::now();
    let ip = client_ip(&headers);
    let repo = UserRepository::new(state.db.pool());

    let Some(identity) = repo.get_by_email(&request.email).await? else {
        tracing::warn!(ip = %ip, "Login failed: unknown email");
        return Err(ApiError::unauthorized(GENERIC_LOGIN_ERROR));
    };

    if state
        .lockout
        .is_locked(identity.failed_attempts as u32, identity.locked_until, now)
    {
        tracing::warn!(ip = %ip, user_id = identity.id, "Login rejected: account locked");
        return Err(ApiError::account_locked("Account is temporarily locked"));
    }

    if !identity.is_active {
        tracing::warn!(ip = %ip, user_id = identity.id, "Login rejected: deactivated account");
        return Err(ApiError::unauthorized(GENERIC_LOGIN_ERROR));
    }

    if verify_password(&request.password, &identity.password).is_err() {
        let lock_state = repo
            .record_login_failure(identity.id, &state.lockout, now)
            .await?;
        if lock_state.is_locked(now) {
            tracing::warn!(ip = %ip, user_id = identity.id, "Account locked after repeated failures");
        } else {
            tracing::warn!(
                ip = %ip,
                user_id = identity.id,
                attempts = lock_state.attempts(),
                "Login failed: wrong password"
            );
        }
        return Err(ApiError::unauthorized(GENERIC_LOGIN_ERROR));
    }

    repo.record_login_success(identity.id, now).await?;

    let token = state
        .tokens
        .issue(identity.id, &identity.email, identity.role.as_str(), now)
        .map_err(|e| {
            tracing::error!(error = %e, "Token issuance failed");
            ApiError::internal("An internal error occurred")
        })?;

    tracing::info!(user_id = identity.id, role = %identity.role, "Login succeeded");

    Ok(Json(LoginResponse {
        token,
        expires_in: state.tokens.session_max_age().num_seconds(),
        user: UserResponse::from(&identity),
    }))
}

/// `POST /api/auth/register`
///
/// Storefront self-registration; the new account is always a customer.
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<RegisterRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let repo = UserRepository::new(state.db.pool());

    validate_password(&request.password, &state.password_policy)
        .map_err(|e| password_policy_error(e.to_string()))?;

    if repo.email_exists(&request.email).await? {
        return Err(ApiError::conflict("An account with this email already exists"));
    }

    let hash = hash_password(&request.password).map_err(|e| {
        tracing::error!(error = %e, "Password hashing failed");
        ApiError::internal("An internal error occurred")
    })?;

    let mut new_identity = NewIdentity::new(&request.email, hash, &request.name);
    if let Some(phone) = request.phone {
        new_identity = new_identity.with_phone(phone);
    }
    let identity = repo.create(&new_identity).await?;

    let now = Utc::now();
    let token = state
        .tokens
        .issue(identity.id, &identity.email, identity.role.as_str(), now)
        .map_err(|e| {
            tracing::error!(error = %e, "Token issuance failed");
            ApiError::internal("An internal error occurred")
        })?;

    tracing::info!(user_id = identity.id, "Account registered");

    Ok(Json(LoginResponse {
        token,
        expires_in: state.tokens.session_max_age().num_seconds(),
        user: UserResponse::from(&identity),
    }))
}

/// `GET /api/auth/me`
pub async fn me(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<UserResponse>, ApiError> {
    let repo = UserRepository::new(state.db.pool());
    let identity = repo
        .get_by_id(user.id)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Invalid or expired token"))?;

    Ok(Json(UserResponse::from(&identity)))
}

/// `PUT /api/auth/profile`
pub async fn update_profile(
    State(state): State<AppState>,
    user: CurrentUser,
    ValidatedJson(request): ValidatedJson<UpdateProfileRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    let repo = UserRepository::new(state.db.pool());

    let mut update = IdentityUpdate::new();
    if let Some(name) = request.name {
        update = update.name(name);
    }
    if let Some(phone) = request.phone {
        update = update.phone(Some(phone));
    }

    let identity = repo
        .update(user.id, &update)
        .await?
        .ok_or_else(|| ApiError::not_found("Account not found"))?;

    Ok(Json(UserResponse::from(&identity)))
}

/// `POST /api/auth/change-password`
///
/// Re-verifies the current password before accepting the new one.
pub async fn change_password(
    State(state): State<AppState>,
    user: CurrentUser,
    ValidatedJson(request): ValidatedJson<ChangePasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let repo = UserRepository::new(state.db.pool());
    let identity = repo
        .get_by_id(user.id)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Invalid or expired token"))?;

    if verify_password(&request.current_password, &identity.password).is_err() {
        tracing::warn!(user_id = user.id, "Password change rejected: wrong current password");
        return Err(ApiError::unauthorized("Current password is incorrect"));
    }

    validate_password(&request.new_password, &state.password_policy)
        .map_err(|e| password_policy_error(e.to_string()))?;

    let hash = hash_password(&request.new_password).map_err(|e| {
        tracing::error!(error = %e, "Password hashing failed");
        ApiError::internal("An internal error occurred")
    })?;

    repo.update(user.id, &IdentityUpdate::new().password(hash))
        .await?;

    tracing::info!(user_id = user.id, "Password changed");

    Ok(Json(MessageResponse::new("Password updated")))
}
