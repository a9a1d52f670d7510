pub mod health;
pub mod pipeline;
pub mod recommend;

pub use health::{health_handler, ready_handler};
pub use pipeline::run_pipeline_handler;
pub use recommend::{personalize_handler, recommend_handler, validate_handler};
