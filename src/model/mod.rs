//! Records that flow through the collect → validate → recommend pipeline.

pub mod types;

pub use types::{
    Feedback, RecommendationReport, ReportEntry, SourceDescriptor, Tool, UserProfile,
    UserRequirements,
};
