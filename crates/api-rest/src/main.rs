//! Standalone REST API server binary.
//!
//! ## Purpose
//! Runs the screener REST API server on its own.
//!
//! ## Intended use
//! This binary is useful for development and debugging when you only want the REST server (with
//! OpenAPI/Swagger UI). The workspace's main `screener-run` binary is the deployment entry point.

use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::{app, AppState};
use screener_core::{
    deadline_from_env_value, optional_env_value, RelayConfig, DEFAULT_CALLER_DEADLINE_SECS,
    DEFAULT_CLIENT_DEADLINE_SECS,
};

/// Main entry point for the screener REST API server.
///
/// Starts the REST API server on the configured address (default: 0.0.0.0:3000).
///
/// # Environment Variables
/// - `SCREENER_REST_ADDR`: Server address (default: "0.0.0.0:3000")
/// - `UPSTREAM_RUN_URL`: Workflow runner run endpoint (required)
/// - `UPSTREAM_API_KEY`: Optional API key for the workflow runner
/// - `UPSTREAM_TWEAK_KEY`: Optional input-tweak component key
/// - `UPSTREAM_DEADLINE_SECS`: Outbound deadline (default: 280)
/// - `CALLER_DEADLINE_SECS`: Assumed caller deadline (default: 320)
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - the relay configuration is missing or inconsistent, or
/// - the server address cannot be bound.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr = std::env::var("SCREENER_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());

    tracing::info!("-- Starting screener REST API on {}", addr);

    let cfg = Arc::new(relay_config_from_env()?);
    let state = AppState::new(cfg)?;

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app(state)).await?;

    Ok(())
}

/// Resolve the relay configuration from the process environment.
fn relay_config_from_env() -> anyhow::Result<RelayConfig> {
    let upstream_url = std::env::var("UPSTREAM_RUN_URL")
        .map_err(|_| anyhow::anyhow!("UPSTREAM_RUN_URL must be set"))?;

    let client_deadline: Duration = deadline_from_env_value(
        std::env::var("UPSTREAM_DEADLINE_SECS").ok(),
        DEFAULT_CLIENT_DEADLINE_SECS,
    )?;
    let caller_deadline: Duration = deadline_from_env_value(
        std::env::var("CALLER_DEADLINE_SECS").ok(),
        DEFAULT_CALLER_DEADLINE_SECS,
    )?;

    Ok(RelayConfig::new(
        upstream_url,
        optional_env_value(std::env::var("UPSTREAM_API_KEY").ok()),
        optional_env_value(std::env::var("UPSTREAM_TWEAK_KEY").ok()),
        client_deadline,
        caller_deadline,
    )?)
}
