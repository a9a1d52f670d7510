//! Recommendation stage: ranks validated tools and shapes the report.

pub mod rank;

pub use rank::{round_score, Recommender};
