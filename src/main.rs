//! Maintenance Agent - HTTP Server Entry Point
//!
//! Reads configuration from the environment and serves the ask/ingest API
//! until interrupted.

use maintenance_agent::{api, config::Config};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "maintenance_agent=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    info!(
        "Loaded configuration: model={}, max_turns={}",
        config.default_model, config.max_turns
    );

    api::serve(config).await?;

    Ok(())
}
