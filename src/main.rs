use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use askweather::config::AskWeatherConfig;
use askweather::orchestrator::QueryOrchestrator;
use askweather::web;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AskWeatherConfig::load().context("Failed to load configuration")?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    tracing::info!(
        model = %config.model.model,
        threshold = config.orchestrator.escalation_threshold,
        "starting askweather"
    );

    let orchestrator = Arc::new(QueryOrchestrator::from_config(&config));
    web::run(orchestrator, config.server.port).await
}
