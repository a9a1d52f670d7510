use crate::error::{AppError, Result};
use crate::handlers::recommend::resolve_n;
use crate::model::{SourceDescriptor, UserRequirements};
use crate::pipeline::PipelineOutcome;
use crate::state::AppState;
use axum::{extract::State, Json};
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Default, Deserialize)]
pub struct RunRequest {
    /// Sources to collect from; the configured list when absent
    pub sources: Option<Vec<SourceDescriptor>>,
    #[serde(default)]
    pub requirements: UserRequirements,
    pub n: Option<i64>,
}

/// POST /pipeline/run - Collect, validate and rank in one pass.
///
/// Skipped sources and failed gates reduce the result but never fail the
/// request; only a browser session that cannot start does.
pub async fn run_pipeline_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RunRequest>,
) -> Result<Json<PipelineOutcome>> {
    let sources = request
        .sources
        .unwrap_or_else(|| state.config.sources.clone());

    if sources.is_empty() {
        return Err(AppError::ValidationError(
            "No sources given. Pass `sources` or set SOURCES.".to_string(),
        ));
    }

    if sources.len() > state.config.max_sources {
        return Err(AppError::ValidationError(format!(
            "Maximum {} sources per request",
            state.config.max_sources
        )));
    }

    let n = resolve_n(request.n, state.pipeline.recommender.default_top_n());
    let outcome = state.pipeline.run(&sources, &request.requirements, n).await?;

    metrics::counter!("recommendation_requests_total").increment(1);
    Ok(Json(outcome))
}
