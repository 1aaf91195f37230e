//! Account management handlers (admin only).

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::auth::{hash_password, validate_password};
use crate::db::{IdentityUpdate, NewIdentity, Role, UserRepository};
use crate::web::dto::{
    CreateUserRequest, ListResponse, UpdateUserRequest, UserListQuery, UserResponse, ValidatedJson,
};
use crate::web::error::ApiError;
use crate::web::middleware::auth::CurrentUser;

use super::AppState;

/// `GET /api/users`
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<UserListQuery>,
) -> Result<Json<ListResponse<UserResponse>>, ApiError> {
    let repo = UserRepository::new(state.db.pool());
    let (filter, pagination) = query.into_filter();

    let total = repo.count(&filter).await?;
    let items = repo
        .list(&filter)
        .await?
        .iter()
        .map(UserResponse::from)
        .collect();

    Ok(Json(ListResponse {
        items,
        total,
        page: pagination.page,
        limit: pagination.limit,
    }))
}

/// `GET /api/users/:id`
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<UserResponse>, ApiError> {
    let repo = UserRepository::new(state.db.pool());
    let identity = repo
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    Ok(Json(UserResponse::from(&identity)))
}

/// `POST /api/users`
pub async fn create(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    let repo = UserRepository::new(state.db.pool());

    validate_password(&request.password, &state.password_policy).map_err(|e| {
        let mut details = std::collections::HashMap::new();
        details.insert("password".to_string(), vec![e.to_string()]);
        ApiError::validation(details)
    })?;

    if repo.email_exists(&request.email).await? {
        return Err(ApiError::conflict("An account with this email already exists"));
    }

    let hash = hash_password(&request.password).map_err(|e| {
        tracing::error!(error = %e, "Password hashing failed");
        ApiError::internal("An internal error occurred")
    })?;

    let mut new_identity = NewIdentity::new(&request.email, hash, &request.name)
        .with_role(request.role.unwrap_or(Role::Customer));
    if let Some(phone) = request.phone {
        new_identity = new_identity.with_phone(phone);
    }

    let identity = repo.create(&new_identity).await?;

    tracing::info!(user_id = identity.id, role = %identity.role, "Account created by admin");

    Ok((StatusCode::CREATED, Json(UserResponse::from(&identity))))
}

/// `PUT /api/users/:id`
pub async fn update(
    State(state): State<AppState>,
    admin: CurrentUser,
    Path(id): Path<i64>,
    ValidatedJson(request): ValidatedJson<UpdateUserRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    let repo = UserRepository::new(state.db.pool());

    // An admin cannot demote or deactivate their own account
    if id == admin.id && (request.role.is_some() || request.is_active == Some(false)) {
        return Err(ApiError::forbidden(
            "Cannot change your own role or deactivate your own account",
        ));
    }

    if let Some(ref email) = request.email {
        if let Some(existing) = repo.get_by_email(email).await? {
            if existing.id != id {
                return Err(ApiError::conflict(
                    "An account with this email already exists",
                ));
            }
        }
    }

    let mut update = IdentityUpdate::new();
    if let Some(email) = request.email {
        update = update.email(email);
    }
    if let Some(name) = request.name {
        update = update.name(name);
    }
    if let Some(phone) = request.phone {
        update = update.phone(Some(phone));
    }
    if let Some(role) = request.role {
        update = update.role(role);
    }
    if let Some(is_active) = request.is_active {
        update = update.is_active(is_active);
    }

    let identity = repo
        .update(id, &update)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    tracing::info!(user_id = identity.id, "Account updated by admin");

    Ok(Json(UserResponse::from(&identity)))
}

/// `DELETE /api/users/:id`
pub async fn delete(
    State(state): State<AppState>,
    admin: CurrentUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    if id == admin.id {
        return Err(ApiError::forbidden("Cannot delete your own account"));
    }

    let repo = UserRepository::new(state.db.pool());
    if !repo.delete(id).await? {
        return Err(ApiError::not_found("User not found"));
    }

    tracing::info!(user_id = id, "Account deleted by admin");

    Ok(StatusCode::NO_CONTENT)
}
