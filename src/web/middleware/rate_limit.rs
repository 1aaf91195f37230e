//! Rate limiting middleware.
//!
//! Fixed-window counters per client address: the count resets when the
//! window duration has elapsed since the first request of the window.
//! Three independent classes (global, admin subtree, login) are applied as
//! separate layers; exceeding any of them rejects the request.

use axum::{
    body::Body,
    extract::ConnectInfo,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::{
    collections::HashMap,
    net::SocketAddr,
    sync::{Arc, RwLock},
    time::{Duration, Instant},
};

use crate::config::{RateLimitConfig, RateWindow};
use crate::web::error::ApiError;

/// Per-key fixed-window counter.
pub struct FixedWindowLimiter {
    windows: RwLock<HashMap<String, (u32, Instant)>>,
    max: u32,
    window: Duration,
}

impl FixedWindowLimiter {
    /// Create a limiter from a configured window.
    pub fn new(config: &RateWindow) -> Self {
        Self::with_limits(config.max, Duration::from_secs(config.window_secs))
    }

    /// Create a limiter with explicit limits.
    pub fn with_limits(max: u32, window: Duration) -> Self {
        Self {
            windows: RwLock::new(HashMap::new()),
            max,
            window,
        }
    }

    /// Whether a request for `key` is admitted right now.
    pub fn check(&self, key: &str) -> bool {
        self.check_at(key, Instant::now())
    }

    /// Increment-and-compare under the write lock, with an explicit clock
    /// for tests.
    pub fn check_at(&self, key: &str, now: Instant) -> bool {
        let mut windows = self.windows.write().unwrap();
        let entry = windows.entry(key.to_string()).or_insert((0, now));

        // Window elapsed since its first request: start a fresh one
        if now.duration_since(entry.1) >= self.window {
            *entry = (0, now);
        }

        if entry.0 >= self.max {
            return false;
        }
        entry.0 += 1;
        true
    }

    /// Evict windows idle for more than a full window duration.
    pub fn cleanup(&self) {
        self.cleanup_at(Instant::now());
    }

    fn cleanup_at(&self, now: Instant) {
        let mut windows = self.windows.write().unwrap();
        windows.retain(|_, (_, start)| now.duration_since(*start) < self.window);
    }

    /// Number of tracked keys.
    pub fn tracked_keys(&self) -> usize {
        self.windows.read().unwrap().len()
    }
}

/// The three rate-limit classes, shared across the router.
pub struct RateLimitState {
    /// Applied to every request.
    pub global: Arc<FixedWindowLimiter>,
    /// Applied to the admin subtree on top of the global class.
    pub admin: Arc<FixedWindowLimiter>,
    /// Applied to the login endpoint on top of the global class.
    pub login: Arc<FixedWindowLimiter>,
}

impl RateLimitState {
    /// Create all three limiters from configuration.
    pub fn new(config: &RateLimitConfig) -> Self {
        Self {
            global: Arc::new(FixedWindowLimiter::new(&config.global)),
            admin: Arc::new(FixedWindowLimiter::new(&config.admin)),
            login: Arc::new(FixedWindowLimiter::new(&config.login)),
        }
    }

    /// Start a background task that periodically evicts idle keys.
    pub fn start_cleanup_task(self: &Arc<Self>) {
        let state = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(Duration::from_secs(300)).await;
                state.global.cleanup();
                state.admin.cleanup();
                state.login.cleanup();
            }
        });
    }
}

/// Extract the client address from a request.
///
/// Prefers X-Forwarded-For (first hop), then X-Real-IP, then the socket
/// address.
pub fn get_client_ip(req: &Request<Body>) -> String {
    if let Some(ip) = client_ip_from_headers(req.headers()) {
        return ip;
    }

    if let Some(ConnectInfo(addr)) = req.extensions().get::<ConnectInfo<SocketAddr>>() {
        return addr.ip().to_string();
    }

    "unknown".to_string()
}

/// Client address from proxy headers alone, for handlers that only have a
/// `HeaderMap`.
pub fn client_ip_from_headers(headers: &axum::http::HeaderMap) -> Option<String> {
    if let Some(forwarded) = headers.get("X-Forwarded-For").and_then(|v| v.to_str().ok()) {
        if let Some(ip) = forwarded.split(',').next() {
            return Some(ip.trim().to_string());
        }
    }

    headers
        .get("X-Real-IP")
        .and_then(|v| v.to_str().ok())
        .map(|ip| ip.to_string())
}

/// Rate limiting middleware for one class. Used via `from_fn` closures so
/// each route subtree can carry its own limiter.
pub async fn rate_limit(
    limiter: Arc<FixedWindowLimiter>,
    class: &'static str,
    req: Request<Body>,
    next: Next,
) -> Response {
    let ip = get_client_ip(&req);

    if !limiter.check(&ip) {
        tracing::warn!(ip = %ip, class = class, "Rate limit exceeded");
        return ApiError::rate_limited("Too many requests. Please try again later.")
            .into_response();
    }

    next.run(req).await
}
