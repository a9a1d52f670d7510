//! Feedback lookup and the feedback quality gate.

use crate::error::{AppError, Result};
use crate::model::Feedback;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;

/// Minimum number of reviews before feedback is trusted.
pub const MIN_REVIEW_COUNT: u32 = 10;

/// Minimum average score before feedback is trusted.
pub const MIN_FEEDBACK_SCORE: f64 = 4.0;

/// Accept feedback with at least 10 reviews and an average of at least 4.0.
pub fn accept_feedback(feedback: &Feedback) -> bool {
    feedback.review_count >= MIN_REVIEW_COUNT && feedback.feedback_score >= MIN_FEEDBACK_SCORE
}

#[async_trait]
pub trait FeedbackSource: Send + Sync {
    /// `Ok(None)` means no feedback is recorded for the tool.
    async fn lookup(&self, tool_name: &str) -> Result<Option<Feedback>>;
}

/// Feedback records held in memory, keyed by exact tool name.
#[derive(Debug, Default)]
pub struct StaticFeedbackStore {
    records: HashMap<String, Feedback>,
}

impl StaticFeedbackStore {
    pub fn new(records: impl IntoIterator<Item = Feedback>) -> Self {
        Self {
            records: records
                .into_iter()
                .map(|f| (f.name.clone(), f))
                .collect(),
        }
    }

    /// Load a JSON array of feedback records. Later duplicates replace earlier ones.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            AppError::service("feedback", format!("Failed to read {}: {}", path.display(), e))
        })?;
        let records: Vec<Feedback> = serde_json::from_str(&raw).map_err(|e| {
            AppError::service("feedback", format!("Failed to parse {}: {}", path.display(), e))
        })?;

        tracing::info!(
            path = %path.display(),
            records = records.len(),
            "Feedback store loaded"
        );

        Ok(Self::new(records))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl FeedbackSource for StaticFeedbackStore {
    async fn lookup(&self, tool_name: &str) -> Result<Option<Feedback>> {
        Ok(self.records.get(tool_name).cloned())
    }
}
