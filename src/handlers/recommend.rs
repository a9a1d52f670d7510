use crate::error::{AppError, Result};
use crate::model::{RecommendationReport, Tool, UserProfile, UserRequirements};
use crate::state::AppState;
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const MIN_SCORE: f64 = 0.0;
const MAX_SCORE: f64 = 5.0;

#[derive(Debug, Deserialize)]
pub struct ValidateRequest {
    pub tools: Vec<Tool>,
    #[serde(default)]
    pub requirements: UserRequirements,
}

#[derive(Debug, Serialize)]
pub struct ValidateResponse {
    pub tools: Vec<Tool>,
}

#[derive(Debug, Deserialize)]
pub struct RecommendRequest {
    pub tools: Vec<Tool>,
    /// Number of recommendations; non-positive values yield none
    pub n: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct PersonalizeRequest {
    pub profile: UserProfile,
    /// The candidate pool to choose from
    pub candidates: Vec<Tool>,
    pub n: Option<i64>,
}

/// POST /validate - Keyword/feature filter over the given tools.
pub async fn validate_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ValidateRequest>,
) -> Result<Json<ValidateResponse>> {
    check_pool(&state, &request.tools)?;

    let tools = state
        .pipeline
        .validator
        .validate_batch(&request.tools, &request.requirements);

    tracing::debug!(input = request.tools.len(), kept = tools.len(), "Validate completed");
    Ok(Json(ValidateResponse { tools }))
}

/// POST /recommend - Rank already validated tools and report the top `n`.
pub async fn recommend_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RecommendRequest>,
) -> Result<Json<RecommendationReport>> {
    check_pool(&state, &request.tools)?;

    let recommender = &state.pipeline.recommender;
    let n = resolve_n(request.n, recommender.default_top_n());
    let ranked = recommender.top_n(&request.tools, n);
    let report = recommender.build_report(&ranked);

    metrics::counter!("recommendation_requests_total").increment(1);
    tracing::info!(
        report_id = %report.report_id,
        pool = request.tools.len(),
        recommended = report.recommendations.len(),
        "Recommendation report generated"
    );

    Ok(Json(report))
}

/// POST /personalize - Match the candidate pool to a user profile, then rank.
pub async fn personalize_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<PersonalizeRequest>,
) -> Result<Json<RecommendationReport>> {
    check_pool(&state, &request.candidates)?;

    let recommender = &state.pipeline.recommender;
    let n = resolve_n(request.n, recommender.default_top_n());
    let ranked = recommender.personalize(&request.profile, &request.candidates, n);
    let report = recommender.build_report(&ranked);

    metrics::counter!("recommendation_requests_total").increment(1);
    tracing::info!(
        report_id = %report.report_id,
        pool = request.candidates.len(),
        recommended = report.recommendations.len(),
        "Personalized report generated"
    );

    Ok(Json(report))
}

pub(crate) fn resolve_n(requested: Option<i64>, default: usize) -> usize {
    match requested {
        Some(n) if n <= 0 => 0,
        Some(n) => usize::try_from(n).unwrap_or(usize::MAX),
        None => default,
    }
}

/// Bound the pool size and reject feedback scores outside 0-5.
fn check_pool(state: &AppState, tools: &[Tool]) -> Result<()> {
    let max = state.config.max_pool_size;
    if tools.len() > max {
        return Err(AppError::ValidationError(format!(
            "Maximum {} tools per request",
            max
        )));
    }

    for tool in tools {
        if let Some(score) = tool.feedback_score {
            if !(MIN_SCORE..=MAX_SCORE).contains(&score) {
                return Err(AppError::ValidationError(format!(
                    "feedback_score of '{}' must lie within {}..={}, got {}",
                    tool.name, MIN_SCORE, MAX_SCORE, score
                )));
            }
        }
    }
    Ok(())
}
