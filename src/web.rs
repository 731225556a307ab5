use std::sync::Arc;
use std::time::Duration;

use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;

use crate::api;
use crate::orchestrator::QueryOrchestrator;

pub async fn run(orchestrator: Arc<QueryOrchestrator>, port: u16) -> anyhow::Result<()> {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Outer bound covering the whole request, above the per-stage deadlines
    let timeout = TimeoutLayer::new(Duration::from_secs(90));

    let app = api::router(orchestrator).layer(cors).layer(timeout);

    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server running at http://localhost:{}", port);
    axum::serve(listener, app).await?;
    Ok(())
}
