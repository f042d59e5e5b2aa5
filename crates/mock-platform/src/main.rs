//! Mock platform binary for running the relay locally.

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use mock_platform::{MockPlatform, router};
use platform_sdk::SessionSigner;
use tracing::info;

/// Mock platform auth and ERP API.
#[derive(Parser, Debug)]
#[command(name = "mock-platform", about = "Mock platform auth and ERP API")]
struct Args {
    /// HTTP listen port.
    #[arg(long, env = "MOCK_PLATFORM_PORT", default_value_t = 4000)]
    port: u16,

    /// Client id accepted by the token endpoint.
    #[arg(long, env = "MOCK_CLIENT_ID", default_value = "mock-client")]
    client_id: String,

    /// Client secret accepted by the token endpoint.
    #[arg(long, env = "MOCK_CLIENT_SECRET", default_value = "mock-secret", hide_env_values = true)]
    client_secret: String,

    /// Key id of the generated signing key.
    #[arg(long, env = "MOCK_KEY_ID", default_value = "mock-key-1")]
    key_id: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let signer = SessionSigner::generate(&args.key_id).context("failed to generate signing key")?;
    info!(key_id = %signer.key_id(), "Ed25519 signing key generated");

    let platform = Arc::new(MockPlatform::new(&args.client_id, &args.client_secret, signer));
    info!(client_id = %args.client_id, "client registered");

    let addr = format!("0.0.0.0:{}", args.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    info!(address = %addr, "mock platform listening");
    axum::serve(listener, router(platform)).await.context("server error")?;
    Ok(())
}
