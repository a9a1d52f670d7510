//! End-to-end run: collect → dedup → validate → rank → report.
//!
//! Stages are connected only through the data they hand each other; none
//! holds a reference to another.

use crate::collector::Collector;
use crate::error::Result;
use crate::model::{RecommendationReport, SourceDescriptor, Tool, UserRequirements};
use crate::recommender::Recommender;
use crate::validator::Validator;
use serde::Serialize;
use std::collections::HashSet;
use std::time::Instant;

/// Counts describing what happened during one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PipelineSummary {
    pub sources: usize,
    pub sources_skipped: usize,
    pub entries_dropped: usize,
    pub collected: usize,
    pub duplicates_dropped: usize,
    pub accepted: usize,
    pub rejected: usize,
    pub gate_failures: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct PipelineOutcome {
    pub report: RecommendationReport,
    pub summary: PipelineSummary,
}

pub struct Pipeline {
    pub collector: Collector,
    pub validator: Validator,
    pub recommender: Recommender,
}

impl Pipeline {
    pub fn new(collector: Collector, validator: Validator, recommender: Recommender) -> Self {
        Self {
            collector,
            validator,
            recommender,
        }
    }

    pub async fn run(
        &self,
        sources: &[SourceDescriptor],
        requirements: &UserRequirements,
        n: usize,
    ) -> Result<PipelineOutcome> {
        let start = Instant::now();

        let collection = self.collector.collect(sources).await?;
        let collected = collection.tools.len();

        let (candidates, duplicates_dropped) = dedup_by_identity(collection.tools);
        let batch = self.validator.evaluate_batch(candidates, requirements).await;

        let ranked = self.recommender.top_n(&batch.accepted, n);
        let report = self.recommender.build_report(&ranked);

        let summary = PipelineSummary {
            sources: sources.len(),
            sources_skipped: collection.sources_skipped,
            entries_dropped: collection.entries_dropped,
            collected,
            duplicates_dropped,
            accepted: batch.accepted.len(),
            rejected: batch.rejected,
            gate_failures: batch.failed,
        };

        let elapsed = start.elapsed();
        metrics::histogram!("pipeline_latency_ms").record(elapsed.as_millis() as f64);
        tracing::info!(
            report_id = %report.report_id,
            sources = summary.sources,
            collected = summary.collected,
            accepted = summary.accepted,
            recommended = report.recommendations.len(),
            total_ms = elapsed.as_millis() as u64,
            "Pipeline run completed"
        );

        Ok(PipelineOutcome { report, summary })
    }
}

/// Merge exact `(name, source)` duplicates, keeping the first occurrence.
///
/// Tools sharing a name but coming from different sources stay distinct.
/// Returns the surviving tools in order and the number dropped.
pub fn dedup_by_identity(tools: Vec<Tool>) -> (Vec<Tool>, usize) {
    let before = tools.len();
    let mut seen: HashSet<(String, String)> = HashSet::with_capacity(before);

    let unique: Vec<Tool> = tools
        .into_iter()
        .filter(|tool| seen.insert((tool.name.clone(), tool.source.clone())))
        .collect();

    let dropped = before - unique.len();
    if dropped > 0 {
        tracing::debug!(dropped, "Merged duplicate tools");
    }
    (unique, dropped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::ToolCardExtractor;
    use crate::config::AcceptancePolicy;
    use crate::mock::{MockFeedbackSource, MockFetcher, MockSentimentAnalyzer};
    use std::sync::Arc;

    #[test]
    fn test_dedup_keeps_first_occurrence() {
        let tools = vec![
            Tool::new("a", "first", "s1"),
            Tool::new("a", "other source", "s2"),
            Tool::new("a", "second", "s1"),
            Tool::new("b", "x", "s1"),
        ];
        let (unique, dropped) = dedup_by_identity(tools);

        assert_eq!(dropped, 1);
        let ids: Vec<_> = unique.iter().map(|t| (t.name.as_str(), t.description.as_str())).collect();
        assert_eq!(ids, vec![("a", "first"), ("a", "other source"), ("b", "x")]);
    }

    #[test]
    fn test_run_future_is_send() {
        fn assert_send<T: Send>(_: T) {}
        let collector = Collector::new(
            Arc::new(MockFetcher::new()),
            Arc::new(ToolCardExtractor::new().unwrap()),
        );
        let pipeline = Pipeline::new(
            collector,
            Validator::new(AcceptancePolicy::keywords_only()),
            Recommender::default(),
        );
        let sources = vec![SourceDescriptor::Dynamic("https://spa.example".into())];
        let requirements = UserRequirements::default();
        assert_send(pipeline.run(&sources, &requirements, 5));
    }

    #[tokio::test]
    async fn test_run_end_to_end() {
        let page = r#"
            <div class="tool-card"><h3>Palace</h3><p>A memory palace builder with spaced review</p></div>
            <div class="tool-card"><h3>Gloom</h3><p>A memory tool nobody enjoys</p></div>
            <div class="tool-card"><h3>Timer</h3><p>Simple focus timer</p></div>
            <div class="tool-card"><h3>Cards</h3><p>Memory flashcards</p></div>
            <div class="tool-card"><h3>Cards</h3><p>Memory flashcards</p></div>
        "#;
        let fetcher = MockFetcher::new()
            .with_page("https://a.example", page)
            .with_status("https://b.example", 503);
        let collector = Collector::new(Arc::new(fetcher), Arc::new(ToolCardExtractor::new().unwrap()));

        let sentiment = MockSentimentAnalyzer::new(0.5).with_score("nobody enjoys", -0.3);
        let feedback = MockFeedbackSource::new().with_feedback("Cards", 4.7, 88);
        let validator = Validator::new(AcceptancePolicy::default())
            .with_sentiment(Arc::new(sentiment))
            .with_feedback(Arc::new(feedback));

        let pipeline = Pipeline::new(collector, validator, Recommender::default());
        let sources = vec![
            SourceDescriptor::Static("https://a.example".into()),
            SourceDescriptor::Static("https://b.example".into()),
        ];
        let outcome = pipeline
            .run(&sources, &UserRequirements::with_keywords(["memory"]), 5)
            .await
            .unwrap();

        let names: Vec<_> = outcome
            .report
            .recommendations
            .iter()
            .map(|e| e.name.as_str())
            .collect();
        assert_eq!(names, vec!["Palace", "Cards"]);
        assert_eq!(outcome.report.recommendations[0].score, 2.5);
        assert_eq!(outcome.report.recommendations[1].score, 4.7);

        assert_eq!(
            outcome.summary,
            PipelineSummary {
                sources: 2,
                sources_skipped: 1,
                entries_dropped: 0,
                collected: 5,
                duplicates_dropped: 1,
                accepted: 2,
                rejected: 2,
                gate_failures: 0,
            }
        );
    }
}
