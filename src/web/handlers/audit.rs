//! Audit trail handlers (admin only).

use axum::{
    extract::{Query, State},
    Json,
};

use crate::audit::AuditEntry;
use crate::web::dto::{AuditListQuery, ListResponse, MessageResponse};
use crate::web::error::ApiError;

use super::AppState;

/// `GET /api/admin/audit` — filtered, newest-first, paginated.
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<AuditListQuery>,
) -> Result<Json<ListResponse<AuditEntry>>, ApiError> {
    let (filter, pagination) = query.into_filter();

    let total = state.audit.len() as i64;
    let items = state.audit.query(&filter);

    Ok(Json(ListResponse {
        items,
        total,
        page: pagination.page,
        limit: pagination.limit,
    }))
}

/// `DELETE /api/admin/audit`
pub async fn clear(State(state): State<AppState>) -> Json<MessageResponse> {
    let count = state.audit.len();
    state.audit.clear();

    tracing::info!(entries = count, "Audit trail cleared");

    Json(MessageResponse::new(format!("Cleared {count} audit entries")))
}
