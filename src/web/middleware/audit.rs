//! Audit trail middleware for the admin surface.
//!
//! Records every state-changing request (POST/PUT/PATCH/DELETE) that passed
//! the authentication gate, with actor, action, resource, client address,
//! status and duration. Reads are not recorded.

use axum::{
    body::Body,
    extract::{OriginalUri, State},
    http::{Method, Request},
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use std::time::Instant;
use uuid::Uuid;

use super::auth::CurrentUser;
use super::rate_limit::get_client_ip;
use crate::audit::AuditEntry;
use crate::web::handlers::AppState;

/// Map an HTTP method to an audit action verb.
fn action_for(method: &Method) -> Option<&'static str> {
    match *method {
        Method::POST => Some("create"),
        Method::PUT | Method::PATCH => Some("update"),
        Method::DELETE => Some("delete"),
        _ => None,
    }
}

/// Resource name from a request path: the first segment after `/api`,
/// skipping the `admin` prefix. `/api/admin/audit` and `/api/products/3`
/// yield `audit` and `products`.
fn resource_for(path: &str) -> String {
    path.split('/')
        .find(|s| !s.is_empty() && *s != "api" && *s != "admin")
        .unwrap_or("unknown")
        .to_string()
}

/// Audit recording middleware. Layered inside the auth gate so the actor
/// extension is present.
pub async fn audit_trail(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    if !state.audit_enabled {
        return next.run(req).await;
    }

    let Some(action) = action_for(req.method()) else {
        return next.run(req).await;
    };

    let actor = req.extensions().get::<CurrentUser>().cloned();
    let method = req.method().to_string();
    // Nested routers see the prefix-stripped URI; record the original path
    let path = req
        .extensions()
        .get::<OriginalUri>()
        .map(|uri| uri.path().to_string())
        .unwrap_or_else(|| req.uri().path().to_string());
    let ip = get_client_ip(&req);
    let started = Instant::now();

    let response = next.run(req).await;

    if let Some(actor) = actor {
        state.audit.append(AuditEntry {
            id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            actor_id: actor.id,
            actor_email: actor.email,
            action: action.to_string(),
            resource: resource_for(&path),
            method,
            path,
            ip: Some(ip),
            status: response.status().as_u16(),
            duration_ms: started.elapsed().as_millis() as u64,
        });
    }

    response
}
