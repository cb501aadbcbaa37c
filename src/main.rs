use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::{app, AppState};
use screener_core::{
    deadline_from_env_value, optional_env_value, RelayConfig, DEFAULT_CALLER_DEADLINE_SECS,
    DEFAULT_CLIENT_DEADLINE_SECS,
};

/// Main entry point for the clinical trial screener.
///
/// Starts the REST server (default port 3000) that relays eligibility checks
/// to the upstream AI workflow runner and serves the FHIR and report
/// exporters.
///
/// # Environment Variables
/// - `SCREENER_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `UPSTREAM_RUN_URL`: Workflow runner run endpoint (required)
/// - `UPSTREAM_API_KEY`: API key sent as `x-api-key` on outbound calls
/// - `UPSTREAM_TWEAK_KEY`: Component key for the runner's tweaks map
/// - `UPSTREAM_DEADLINE_SECS`: Outbound call deadline (default: 280)
/// - `CALLER_DEADLINE_SECS`: Assumed caller deadline (default: 320)
///
/// # Returns
/// * `Ok(())` - If the server starts and runs successfully
/// * `Err(anyhow::Error)` - If configuration or server startup fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("screener_core=info".parse()?)
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest_addr = std::env::var("SCREENER_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());

    tracing::info!("++ Starting screener REST on {}", rest_addr);

    let cfg = Arc::new(relay_config_from_env()?);
    tracing::info!(
        upstream = %cfg.upstream_url(),
        client_deadline_secs = cfg.client_deadline().as_secs(),
        "resolved relay configuration"
    );

    let state = AppState::new(cfg)?;

    let listener = tokio::net::TcpListener::bind(&rest_addr).await?;
    axum::serve(listener, app(state)).await?;

    Ok(())
}

/// Resolve the relay configuration from the process environment.
///
/// All reads happen here, once, at startup. Request handlers only ever see
/// the resolved [`RelayConfig`].
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
