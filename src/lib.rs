//! Toolscout - tool discovery and recommendation service
//!
//! Collects tool cards from web sources, filters them through keyword,
//! sentiment and feedback gates, and ranks what survives into a report.
//! The library exposes each stage on its own so hosts can compose them.

pub mod collector;
pub mod config;
pub mod error;
pub mod handlers;
pub mod mock;
pub mod model;
pub mod pipeline;
pub mod recommender;
pub mod state;
pub mod validator;

// Re-export key types for convenience
pub use collector::Collector;
pub use config::{AcceptancePolicy, Config, RankingConfig};
pub use error::{AppError, Result};
pub use handlers::{
    health_handler, personalize_handler, ready_handler, recommend_handler, run_pipeline_handler,
    validate_handler,
};
pub use model::{
    Feedback, RecommendationReport, SourceDescriptor, Tool, UserProfile, UserRequirements,
};
pub use pipeline::{Pipeline, PipelineOutcome, PipelineSummary};
pub use recommender::Recommender;
pub use state::AppState;
pub use validator::Validator;
