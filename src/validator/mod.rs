//! Validation stage: narrows candidates to tools that pass the acceptance gates.
//!
//! Three independent gates exist: keyword/feature matching (pure), sentiment
//! positivity and feedback quality (both backed by external collaborators).
//! [`Validator`] composes them according to an [`AcceptancePolicy`].
//!
//! [`AcceptancePolicy`]: crate::config::AcceptancePolicy

pub mod feedback;
pub mod gates;
pub mod requirements;
pub mod sentiment;

pub use feedback::{accept_feedback, FeedbackSource, StaticFeedbackStore};
pub use gates::{BatchOutcome, Rejection, Validator, Verdict};
pub use requirements::{validate_batch, validate_one};
pub use sentiment::{HttpSentimentAnalyzer, SentimentAnalyzer, SentimentScore};
