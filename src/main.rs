use anyhow::{Context, Result};
use loschat::{config, server};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let config = config::load()
        .await
        .context("failed to load configuration")?;

    // RUST_LOG wins over the configured level; either way the directive must
    // parse before logging comes up.
    let log_level =
        std::env::var("RUST_LOG").unwrap_or_else(|_| config.server.logs.level.clone());
    let filter = tracing_subscriber::EnvFilter::try_new(&log_level).with_context(|| {
        format!(
            "invalid log level '{}', expected error, warn, info, debug or trace",
            log_level
        )
    })?;

    tracing_subscriber::fmt().with_env_filter(filter).json().init();

    info!(%log_level, "starting loschat");

    server::run(config).await?;

    Ok(())
}
