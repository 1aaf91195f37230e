//! Web API Authentication Tests
//!
//! Integration tests for login, registration, lockout, and session
//! handling.

use axum::http::header::AUTHORIZATION;
use axum::http::StatusCode;
use axum_test::TestServer;
use mugshop::auth::{LockoutPolicy, TokenIssuer};
use mugshop::config::{
    AuditConfig, JwtConfig, LockoutConfig, PasswordPolicyConfig, RateLimitConfig, RateWindow,
};
use mugshop::web::middleware::RateLimitState;
use mugshop::web::{create_router, AppState};
use mugshop::{Database, MemoryAuditStore};
use serde_json::{json, Value};
use std::sync::Arc;

fn test_jwt_config() -> JwtConfig {
    JwtConfig {
        secret: "test-secret-key-for-testing-only".to_string(),
        ..JwtConfig::default()
    }
}

/// Rate limits high enough to stay out of the way of the other tests.
fn permissive_rate_limits() -> RateLimitConfig {
    RateLimitConfig {
        global: RateWindow {
            window_secs: 900,
            max: 10_000,
        },
        admin: RateWindow {
            window_secs: 900,
            max: 10_000,
        },
        login: RateWindow {
            window_secs: 900,
            max: 10_000,
        },
    }
}

/// Create a test server with an in-memory database.
async fn create_test_server_with(rate_config: RateLimitConfig) -> TestServer {
    let db = Database::open_in_memory()
        .await
        .expect("Failed to create test database");

    let state = AppState {
        db: Arc::new(db),
        tokens: Arc::new(TokenIssuer::new(&test_jwt_config())),
        lockout: Arc::new(LockoutPolicy::new(&LockoutConfig::default())),
        password_policy: Arc::new(PasswordPolicyConfig::default()),
        audit: Arc::new(MemoryAuditStore::new(&AuditConfig::default())),
        audit_enabled: true,
    };

    let rate = Arc::new(RateLimitState::new(&rate_config));
    let router = create_router(state, rate, &[]);

    TestServer::new(router).expect("Failed to create test server")
}

async fn create_test_server() -> TestServer {
    create_test_server_with(permissive_rate_limits()).await
}

/// Register a customer account and return the response body.
async fn register_user(server: &TestServer, email: &str, password: &str) -> Value {
    let response = server
        .post("/api/auth/register")
        .json(&json!({
            "email": email,
            "password": password,
            "name": "Test User"
        }))
        .await;
    response.assert_status_ok();
    response.json::<Value>()
}

async fn login(server: &TestServer, email: &str, password: &str) -> axum_test::TestResponse {
    server
        .post("/api/auth/login")
        .json(&json!({
            "email": email,
            "password": password
        }))
        .await
}

// ============================================================================
// Registration
// ============================================================================

#[tokio::test]
async fn test_register_success() {
    let server = create_test_server().await;

    let body = register_user(&server, "alice@example.com", "Password-123").await;

    assert!(body["token"].is_string());
    assert_eq!(body["user"]["email"], "alice@example.com");
    assert_eq!(body["user"]["role"], "customer");
    assert!(body["user"].get("password").is_none());
}

#[tokio::test]
async fn test_register_duplicate_email() {
    let server = create_test_server().await;

    register_user(&server, "alice@example.com", "Password-123").await;

    let response = server
        .post("/api/auth/register")
        .json(&json!({
            "email": "Alice@Example.com",
            "password": "Password-456",
            "name": "Impostor"
        }))
        .await;

    // Email matching is case-insensitive
    response.assert_status(StatusCode::CONFLICT);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "CONFLICT");
}

#[tokio::test]
async fn test_register_rejects_weak_password() {
    let server = create_test_server().await;

    let response = server
        .post("/api/auth/register")
        .json(&json!({
            "email": "alice@example.com",
            "password": "short",
            "name": "Alice"
        }))
        .await;

    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    assert!(body["error"]["details"]["password"].is_array());
}

#[tokio::test]
async fn test_register_rejects_invalid_email() {
    let server = create_test_server().await;

    let response = server
        .post("/api/auth/register")
        .json(&json!({
            "email": "not-an-email",
            "password": "Password-123",
            "name": "Alice"
        }))
        .await;

    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
}

// ============================================================================
// Login
// ============================================================================

#[tokio::test]
async fn test_login_success() {
    let server = create_test_server().await;
    register_user(&server, "alice@example.com", "Password-123").await;

    let response = login(&server, "alice@example.com", "Password-123").await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert!(body["token"].is_string());
    assert_eq!(body["expires_in"], 4 * 60 * 60);
    assert_eq!(body["user"]["email"], "alice@example.com");
}

#[tokio::test]
async fn test_login_failures_are_indistinguishable() {
    let server = create_test_server().await;
    register_user(&server, "alice@example.com", "Password-123").await;

    let wrong_password = login(&server, "alice@example.com", "Wrong-Password-1").await;
    wrong_password.assert_status(StatusCode::UNAUTHORIZED);
    let wrong_password: Value = wrong_password.json();

    let unknown_email = login(&server, "nobody@example.com", "Password-123").await;
    unknown_email.assert_status(StatusCode::UNAUTHORIZED);
    let unknown_email: Value = unknown_email.json();

    // Same message regardless of which check failed
    assert_eq!(
        wrong_password["error"]["message"],
        unknown_email["error"]["message"]
    );
    assert_eq!(wrong_password["error"]["message"], "Invalid email or password");
}

// ============================================================================
// Account lockout
// ============================================================================

#[tokio::test]
async fn test_account_locks_after_five_failures() {
    let server = create_test_server().await;
    register_user(&server, "alice@example.com", "Password-123").await;

    for _ in 0..5 {
        login(&server, "alice@example.com", "Wrong-Password-1")
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }

    // Even the correct password is rejected while the lock holds
    let response = login(&server, "alice@example.com", "Password-123").await;
    response.assert_status(StatusCode::LOCKED);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "ACCOUNT_LOCKED");
}

#[tokio::test]
async fn test_successful_login_resets_failure_counter() {
    let server = create_test_server().await;
    register_user(&server, "alice@example.com", "Password-123").await;

    for _ in 0..4 {
        login(&server, "alice@example.com", "Wrong-Password-1")
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }

    login(&server, "alice@example.com", "Password-123")
        .await
        .assert_status_ok();

    // Eight cumulative failures would have locked the account had the
    // counter survived the successful login
    for _ in 0..4 {
        login(&server, "alice@example.com", "Wrong-Password-1")
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }

    login(&server, "alice@example.com", "Password-123")
        .await
        .assert_status_ok();
}

// ============================================================================
// Token handling
// ============================================================================

#[tokio::test]
async fn test_me_requires_token() {
    let server = create_test_server().await;

    let response = server.get("/api/auth/me").await;
    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_me_returns_current_account() {
    let server = create_test_server().await;
    let body = register_user(&server, "alice@example.com", "Password-123").await;
    let token = body["token"].as_str().unwrap();

    let response = server
        .get("/api/auth/me")
        .add_header(AUTHORIZATION, format!("Bearer {token}"))
        .await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["email"], "alice@example.com");
    assert!(body.get("password").is_none());
    assert!(body.get("failed_attempts").is_none());
}

#[tokio::test]
async fn test_tampered_token_rejected() {
    let server = create_test_server().await;
    let body = register_user(&server, "alice@example.com", "Password-123").await;
    let token = body["token"].as_str().unwrap();

    // Flip a character in the signature
    let mut tampered = token.to_string();
    let last = tampered.pop().unwrap();
    tampered.push(if last == 'a' { 'b' } else { 'a' });

    let response = server
        .get("/api/auth/me")
        .add_header(AUTHORIZATION, format!("Bearer {tampered}"))
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_garbage_token_rejected() {
    let server = create_test_server().await;

    let response = server
        .get("/api/auth/me")
        .add_header(AUTHORIZATION, "Bearer not-a-jwt")
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);
}

// ============================================================================
// Profile and password self-service
// ============================================================================

#[tokio::test]
async fn test_update_profile() {
    let server = create_test_server().await;
    let body = register_user(&server, "alice@example.com", "Password-123").await;
    let token = body["token"].as_str().unwrap();

    let response = server
        .put("/api/auth/profile")
        .add_header(AUTHORIZATION, format!("Bearer {token}"))
        .json(&json!({
            "name": "Alice Updated",
            "phone": "555-0100"
        }))
        .await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["name"], "Alice Updated");
    assert_eq!(body["phone"], "555-0100");
}

#[tokio::test]
async fn test_change_password_requires_current_password() {
    let server = create_test_server().await;
    let body = register_user(&server, "alice@example.com", "Password-123").await;
    let token = body["token"].as_str().unwrap();

    let response = server
        .post("/api/auth/change-password")
        .add_header(AUTHORIZATION, format!("Bearer {token}"))
        .json(&json!({
            "current_password": "Wrong-Password-1",
            "new_password": "New-Password-456"
        }))
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_change_password_flow() {
    let server = create_test_server().await;
    let body = register_user(&server, "alice@example.com", "Password-123").await;
    let token = body["token"].as_str().unwrap();

    // New password must satisfy the policy
    server
        .post("/api/auth/change-password")
        .add_header(AUTHORIZATION, format!("Bearer {token}"))
        .json(&json!({
            "current_password": "Password-123",
            "new_password": "weak"
        }))
        .await
        .assert_status(StatusCode::UNPROCESSABLE_ENTITY);

    server
        .post("/api/auth/change-password")
        .add_header(AUTHORIZATION, format!("Bearer {token}"))
        .json(&json!({
            "current_password": "Password-123",
            "new_password": "New-Password-456"
        }))
        .await
        .assert_status_ok();

    login(&server, "alice@example.com", "Password-123")
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
    login(&server, "alice@example.com", "New-Password-456")
        .await
        .assert_status_ok();
}

// ============================================================================
// Login rate limiting
// ============================================================================

#[tokio::test]
async fn test_login_rate_limit() {
    let server = create_test_server_with(RateLimitConfig {
        login: RateWindow {
            window_secs: 900,
            max: 3,
        },
        ..permissive_rate_limits()
    })
    .await;

    // Unknown email: each attempt fails with 401 until the window fills
    for _ in 0..3 {
        login(&server, "nobody@example.com", "whatever")
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }

    let response = login(&server, "nobody@example.com", "whatever").await;
    response.assert_status(StatusCode::TOO_MANY_REQUESTS);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "RATE_LIMITED");
}

#[tokio::test]
async fn test_login_rate_limit_is_per_client() {
    let server = create_test_server_with(RateLimitConfig {
        login: RateWindow {
            window_secs: 900,
            max: 2,
        },
        ..permissive_rate_limits()
    })
    .await;

    for _ in 0..2 {
        server
            .post("/api/auth/login")
            .add_header("x-forwarded-for", "10.0.0.1")
            .json(&json!({"email": "nobody@example.com", "password": "x"}))
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }
    server
        .post("/api/auth/login")
        .add_header("x-forwarded-for", "10.0.0.1")
        .json(&json!({"email": "nobody@example.com", "password": "x"}))
        .await
        .assert_status(StatusCode::TOO_MANY_REQUESTS);

    // A different client address is still admitted
    server
        .post("/api/auth/login")
        .add_header("x-forwarded-for", "10.0.0.2")
        .json(&json!({"email": "nobody@example.com", "password": "x"}))
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

// ============================================================================
// Health
// ============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let server = create_test_server().await;

    let response = server.get("/health").await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["status"], "ok");
}
