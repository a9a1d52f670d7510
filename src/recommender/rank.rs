use crate::config::RankingConfig;
use crate::model::{RecommendationReport, ReportEntry, Tool, UserProfile};
use crate::validator::validate_batch;
use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use uuid::Uuid;

/// Ranks tools and builds reports. Never re-validates content.
#[derive(Debug, Clone, Copy, Default)]
pub struct Recommender {
    ranking: RankingConfig,
}

impl Recommender {
    pub fn new(ranking: RankingConfig) -> Self {
        Self { ranking }
    }

    pub fn default_top_n(&self) -> usize {
        self.ranking.default_top_n
    }

    /// Feedback score used for ranking and reporting.
    pub fn effective_score(&self, tool: &Tool) -> f64 {
        tool.feedback_score.unwrap_or(self.ranking.missing_score)
    }

    /// The `n` best tools.
    ///
    /// Longer descriptions rank first; equal lengths fall back to the higher
    /// feedback score. Remaining ties keep their input order.
    pub fn top_n(&self, tools: &[Tool], n: usize) -> Vec<Tool> {
        let mut ranked: Vec<&Tool> = tools.iter().collect();

        // sort_by is stable
        ranked.sort_by(|a, b| self.compare(a, b));

        ranked.into_iter().take(n).cloned().collect()
    }

    fn compare(&self, a: &Tool, b: &Tool) -> Ordering {
        description_len(b)
            .cmp(&description_len(a))
            .then_with(|| self.effective_score(b).total_cmp(&self.effective_score(a)))
    }

    /// Report for `recommendations`, preserving their order and count.
    pub fn build_report(&self, recommendations: &[Tool]) -> RecommendationReport {
        self.build_report_at(recommendations, Utc::now())
    }

    pub fn build_report_at(
        &self,
        recommendations: &[Tool],
        generated_at: DateTime<Utc>,
    ) -> RecommendationReport {
        let entries = recommendations
            .iter()
            .map(|tool| ReportEntry {
                name: tool.name.clone(),
                description: tool.description.clone(),
                score: round_score(self.effective_score(tool)),
                source: tool.source.clone(),
            })
            .collect();

        RecommendationReport {
            report_id: Uuid::new_v4(),
            recommendations: entries,
            generated_at,
        }
    }

    /// Validate `candidates` against the profile's capabilities, then rank.
    pub fn personalize(&self, profile: &UserProfile, candidates: &[Tool], n: usize) -> Vec<Tool> {
        let requirements = profile.requirements();
        let matching = validate_batch(candidates, &requirements);

        tracing::debug!(
            capabilities = profile.capabilities.len(),
            candidates = candidates.len(),
            matching = matching.len(),
            "Personalized candidate pool"
        );

        self.top_n(&matching, n)
    }
}

/// Description length in characters.
fn description_len(tool: &Tool) -> usize {
    tool.description.chars().count()
}

/// Round to one decimal place, halves away from zero.
///
/// `4.25` becomes `4.3`, not the `4.2` that round-half-to-even gives.
pub fn round_score(score: f64) -> f64 {
    (score * 10.0).round() / 10.0
}
