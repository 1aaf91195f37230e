//! HTTP server startup.

use std::net::SocketAddr;
use std::sync::Arc;

use crate::config::Config;
use crate::error::Result;

use super::handlers::AppState;
use super::middleware::RateLimitState;
use super::router::create_router;

/// Bind the configured address and serve the API until the process exits.
pub async fn serve(config: &Config, state: AppState, rate: Arc<RateLimitState>) -> Result<()> {
    let router = create_router(state, rate, &config.server.cors_origins);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!(address = %addr, "mugshop API listening");

    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
