use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;

use crate::config::{AppConfig, ServerConfig};
use crate::routes::app_router;
use crate::state::AppState;

pub async fn run_server(config: AppConfig) -> anyhow::Result<()> {
    let state = AppState::from_config(&config).context("failed to initialise the pipeline")?;
    let app = app_router(state);
    let listener = bind(&config.server).await?;

    info!("docqa listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;
    info!("docqa stopped");
    Ok(())
}

/// Bind the configured address. The host may be a name (`localhost`) or an
/// IPv4/IPv6 literal (`0.0.0.0`, `::`).
async fn bind(server: &ServerConfig) -> anyhow::Result<TcpListener> {
    TcpListener::bind((server.host.as_str(), server.port))
        .await
        .with_context(|| format!("failed to bind {}:{}", server.host, server.port))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
