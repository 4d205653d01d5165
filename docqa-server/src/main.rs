use anyhow::Context;
use docqa_server::config::AppConfig;
use docqa_server::server::run_server;
use docqa_server::telemetry::init_tracing;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine; the real environment still applies.
    let _ = dotenvy::dotenv();

    let config = AppConfig::from_env().context("invalid configuration")?;
    init_tracing(config.log_format)?;

    run_server(config).await
}
