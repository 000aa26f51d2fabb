// Church Admin - Web Server
// REST API with Axum over the configured store backend

use anyhow::{Context, Result};
use church_admin::{server, AppConfig, ChurchContext};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config_path = std::env::var_os("CHURCH_CONFIG").map(PathBuf::from);
    let config = AppConfig::load(config_path.as_deref()).context("loading configuration")?;

    let ctx = ChurchContext::from_config(&config).context("opening church data")?;
    let app = server::router(Arc::new(ctx));

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("binding {}", config.bind_addr))?;

    info!(
        addr = %config.bind_addr,
        backend = ?config.backend,
        version = church_admin::VERSION,
        "church admin API listening"
    );

    axum::serve(listener, app).await.context("serving HTTP")?;
    Ok(())
}
