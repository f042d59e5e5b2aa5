//! ERP relay service binary.

use std::sync::Arc;

use anyhow::Context;
use erp_relay::{AppState, RelayConfig, build_app};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = RelayConfig::load();

    if !config.credentials().is_complete() {
        warn!("CLIENT_ID and CLIENT_SECRET are not both set; platform calls will fail");
    }
    let environment = config.environment();
    if environment.is_unnamed() {
        warn!("API_ENVIRONMENT is not set; platform hosts will contain an empty environment label");
    }
    info!(environment = %environment, "platform environment selected");

    let state = Arc::new(AppState::from_config(&config).context("failed to build HTTP client")?);
    let app = build_app(state, &config.allowed_origins);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    info!(address = %addr, "ERP relay listening");
    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
