//! Router configuration for the mugshop API.
//!
//! Route guarding is layered: the global rate-limit class and security
//! headers wrap everything, the login and admin classes wrap their
//! subtrees, and protected routes stack the auth gate, the role guard,
//! and (for state-changing admin operations) the audit recorder.

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use super::handlers::{self, audit, auth, order, product, user, AppState};
use super::middleware::{
    audit_trail, auth_gate, create_cors_layer, rate_limit, require_roles, security_headers,
    RateLimitState,
};
use crate::db::Role;

/// Roles allowed to read back-office data.
const BACK_OFFICE: &[Role] = &[Role::Admin, Role::Staff, Role::ReadOnly];
/// Roles allowed to modify catalog and orders.
const ADMIN_STAFF: &[Role] = &[Role::Admin, Role::Staff];
/// Admin only.
const ADMIN_ONLY: &[Role] = &[Role::Admin];

/// Create the main API router.
pub fn create_router(
    state: AppState,
    rate: Arc<RateLimitState>,
    cors_origins: &[String],
) -> Router {
    let gate = middleware::from_fn_with_state(state.clone(), auth_gate);
    let recorder = middleware::from_fn_with_state(state.clone(), audit_trail);

    let back_office_read = ServiceBuilder::new()
        .layer(gate.clone())
        .layer(middleware::from_fn(|req, next| {
            require_roles(BACK_OFFICE, req, next)
        }));

    let staff_write = ServiceBuilder::new()
        .layer(gate.clone())
        .layer(middleware::from_fn(|req, next| {
            require_roles(ADMIN_STAFF, req, next)
        }))
        .layer(recorder.clone());

    let admin_write = ServiceBuilder::new()
        .layer(gate.clone())
        .layer(middleware::from_fn(|req, next| {
            require_roles(ADMIN_ONLY, req, next)
        }))
        .layer(recorder.clone());

    // /api/auth: login (login rate-limit class) and register are public,
    // the rest requires a valid session
    let auth_routes = Router::new()
        .route(
            "/login",
            post(auth::login).layer(middleware::from_fn({
                let limiter = rate.login.clone();
                move |req, next| rate_limit(limiter.clone(), "login", req, next)
            })),
        )
        .route("/register", post(auth::register))
        .route("/me", get(auth::me).layer(gate.clone()))
        .route("/profile", put(auth::update_profile).layer(gate.clone()))
        .route(
            "/change-password",
            post(auth::change_password).layer(gate.clone()),
        );

    // /api/products: reads are public, writes are admin/staff
    let product_routes = Router::new()
        .route(
            "/",
            get(product::list).merge(post(product::create).layer(staff_write.clone())),
        )
        .route(
            "/:id",
            get(product::get).merge(
                put(product::update)
                    .delete(product::delete)
                    .layer(staff_write.clone()),
            ),
        );

    // /api/orders: checkout is public, management is back-office
    let order_routes = Router::new()
        .route(
            "/",
            post(order::create).merge(get(order::list).layer(back_office_read.clone())),
        )
        .route("/:id", get(order::get).layer(back_office_read))
        .route("/:id/status", put(order::update_status).layer(staff_write));

    // /api/users: admin only, additionally under the admin rate-limit class
    let user_routes = Router::new()
        .route("/", get(user::list).merge(post(user::create)))
        .route(
            "/:id",
            get(user::get)
                .merge(put(user::update))
                .merge(delete(user::delete)),
        )
        .layer(admin_write.clone())
        .layer(middleware::from_fn({
            let limiter = rate.admin.clone();
            move |req, next| rate_limit(limiter.clone(), "admin", req, next)
        }));

    // /api/admin: audit trail, admin only, admin rate-limit class
    let admin_routes = Router::new()
        .route("/audit", get(audit::list).delete(audit::clear))
        .layer(admin_write)
        .layer(middleware::from_fn({
            let limiter = rate.admin.clone();
            move |req, next| rate_limit(limiter.clone(), "admin", req, next)
        }));

    let api_routes = Router::new()
        .nest("/auth", auth_routes)
        .nest("/products", product_routes)
        .nest("/orders", order_routes)
        .nest("/users", user_routes)
        .nest("/admin", admin_routes);

    Router::new()
        .route("/health", get(handlers::health))
        .nest("/api", api_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(create_cors_layer(cors_origins))
                .layer(middleware::from_fn(security_headers))
                .layer(middleware::from_fn({
                    let limiter = rate.global.clone();
                    move |req, next| rate_limit(limiter.clone(), "global", req, next)
                })),
        )
        .with_state(state)
}
