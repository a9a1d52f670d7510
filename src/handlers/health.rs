use crate::state::AppState;
use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use std::sync::Arc;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

impl HealthResponse {
    fn new(status: &'static str) -> Json<Self> {
        Json(Self {
            status,
            version: env!("CARGO_PKG_VERSION"),
        })
    }
}

/// GET /health - Liveness probe
pub async fn health_handler() -> Json<HealthResponse> {
    HealthResponse::new("healthy")
}

/// GET /ready - Readiness probe (collaborator checks passed)
pub async fn ready_handler(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<HealthResponse>) {
    if state.is_ready() {
        (StatusCode::OK, HealthResponse::new("ready"))
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, HealthResponse::new("not_ready"))
    }
}
