//! HTTP API surface
//!
//! Two routes: `POST /ask` resolves a free-text query and `GET /health`
//! reports downstream reachability. A query that cannot be answered is still
//! a 200 with an `error` or `needs_location` status in the body; the only
//! non-200 answers are for malformed requests.

use std::sync::Arc;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, post},
};
use serde::Serialize;
use tracing::debug;

use crate::models::{HealthReport, QueryRequest, QueryResult};
use crate::orchestrator::QueryOrchestrator;

/// Body of the health endpoint
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub downstream: HealthReport,
}

pub fn router(orchestrator: Arc<QueryOrchestrator>) -> Router {
    Router::new()
        .route("/ask", post(ask))
        .route("/health", get(health))
        .with_state(orchestrator)
}

async fn ask(
    State(orchestrator): State<Arc<QueryOrchestrator>>,
    Json(request): Json<QueryRequest>,
) -> Result<Json<QueryResult>, (StatusCode, String)> {
    if request.query.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, "query must not be empty".into()));
    }

    debug!(query = %request.query, "handling query");
    Ok(Json(orchestrator.handle(request).await))
}

async fn health(
    State(orchestrator): State<Arc<QueryOrchestrator>>,
) -> (StatusCode, Json<HealthResponse>) {
    let downstream = orchestrator.health().await;
    let (code, status) = if downstream.all_healthy() {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    };
    let body = HealthResponse {
        status,
        version: crate::VERSION,
        downstream,
    };
    (code, Json(body))
}
