//! Type definitions for the pipeline data model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use uuid::Uuid;

/// A discovered tool candidate.
///
/// Identity is the `(name, source)` pair. The collector creates these with
/// empty `features` and no feedback fields; the validator fills the feedback
/// fields from accepted feedback. The recommender only reads and reorders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tool {
    pub name: String,

    pub description: String,

    /// Source identifier (URL or source id) the tool was extracted from
    pub source: String,

    #[serde(default)]
    pub features: BTreeSet<String>,

    /// Average review score in `0.0..=5.0`, set only from accepted feedback
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback_score: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review_count: Option<u32>,
}

impl Tool {
    /// Creates a freshly collected tool with no features and no feedback.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            source: source.into(),
            features: BTreeSet::new(),
            feedback_score: None,
            review_count: None,
        }
    }

    pub fn with_features<I, S>(mut self, features: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.features = features.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_feedback_score(mut self, score: f64) -> Self {
        self.feedback_score = Some(score);
        self
    }

    /// The `(name, source)` identity pair.
    pub fn identity(&self) -> (&str, &str) {
        (&self.name, &self.source)
    }

    /// Copies the quality signals of `feedback` onto this tool.
    pub fn enrich(&mut self, feedback: &Feedback) {
        self.feedback_score = Some(feedback.feedback_score);
        self.review_count = Some(feedback.review_count);
    }
}

/// Validation criteria supplied per validation call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserRequirements {
    /// All keywords must appear in the description (case-insensitive)
    #[serde(default)]
    pub keywords: Vec<String>,

    /// All features must be present in the tool's feature set
    #[serde(default)]
    pub features: BTreeSet<String>,
}

impl UserRequirements {
    pub fn with_keywords<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keywords: keywords.into_iter().map(Into::into).collect(),
            features: BTreeSet::new(),
        }
    }
}

/// Externally sourced review data for a tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feedback {
    pub name: String,
    pub feedback_score: f64,
    pub review_count: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub capabilities: Vec<String>,
}

impl UserProfile {
    /// Builds requirements with the profile's capabilities as keywords.
    pub fn requirements(&self) -> UserRequirements {
        UserRequirements::with_keywords(self.capabilities.iter().cloned())
    }
}

/// One line of a recommendation report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportEntry {
    pub name: String,
    pub description: String,
    /// Feedback score rounded to one decimal
    pub score: f64,
    pub source: String,
}

/// Ranked recommendations, stamped at construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationReport {
    pub report_id: Uuid,
    pub recommendations: Vec<ReportEntry>,
    pub generated_at: DateTime<Utc>,
}

/// Where a batch of tool cards comes from.
///
/// Static sources are fetched directly; dynamic sources need a rendered page
/// from the browser session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "url", rename_all = "snake_case")]
pub enum SourceDescriptor {
    Static(String),
    Dynamic(String),
}

impl SourceDescriptor {
    /// Parses `dynamic:<url>` as a dynamic source, anything else as static.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        match raw.strip_prefix("dynamic:") {
            Some(url) => Self::Dynamic(url.trim().to_string()),
            None => Self::Static(raw.to_string()),
        }
    }

    pub fn url(&self) -> &str {
        match self {
            Self::Static(url) | Self::Dynamic(url) => url,
        }
    }

    pub fn is_dynamic(&self) -> bool {
        matches!(self, Self::Dynamic(_))
    }
}

impl fmt::Display for SourceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static(url) => f.write_str(url),
            Self::Dynamic(url) => write!(f, "dynamic:{}", url),
        }
    }
}
