use crate::config::AcceptancePolicy;
use crate::error::{AppError, Result};
use crate::model::{Feedback, Tool, UserRequirements};
use crate::validator::feedback::{accept_feedback, FeedbackSource, StaticFeedbackStore};
use crate::validator::requirements;
use crate::validator::sentiment::{self, SentimentAnalyzer, POSITIVITY_THRESHOLD};
use futures::future::{BoxFuture, FutureExt};
use futures::stream::{self, StreamExt};
use std::fmt;
use std::sync::Arc;

/// Why a tool was turned away by a gate it was evaluated against.
#[derive(Debug, Clone, PartialEq)]
pub enum Rejection {
    Requirements,
    NotPositive { score: f64 },
    Feedback,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::Requirements => f.write_str("keyword/feature requirements not met"),
            Rejection::NotPositive { score } => write!(f, "sentiment score {} not positive", score),
            Rejection::Feedback => f.write_str("no trusted feedback"),
        }
    }
}

/// Outcome of evaluating one tool against all configured gates.
#[derive(Debug)]
pub enum Verdict {
    Accepted(Tool),
    Rejected { tool: String, reason: Rejection },
    /// A collaborator failed; the tool is excluded but the batch continues.
    Failed { tool: String, error: AppError },
}

#[derive(Debug, Default)]
pub struct BatchOutcome {
    /// Accepted tools in input order
    pub accepted: Vec<Tool>,
    pub rejected: usize,
    pub failed: usize,
}

pub struct Validator {
    sentiment: Option<Arc<dyn SentimentAnalyzer>>,
    feedback: Arc<dyn FeedbackSource>,
    policy: AcceptancePolicy,
    max_concurrency: usize,
}

impl Validator {
    /// A validator with no collaborators beyond an empty feedback store.
    pub fn new(policy: AcceptancePolicy) -> Self {
        Self {
            sentiment: None,
            feedback: Arc::new(StaticFeedbackStore::default()),
            policy,
            max_concurrency: 8,
        }
    }

    pub fn with_sentiment(mut self, analyzer: Arc<dyn SentimentAnalyzer>) -> Self {
        self.sentiment = Some(analyzer);
        self
    }

    pub fn with_feedback(mut self, source: Arc<dyn FeedbackSource>) -> Self {
        self.feedback = source;
        self
    }

    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    pub fn policy(&self) -> AcceptancePolicy {
        self.policy
    }

    pub fn validate_one(&self, tool: &Tool, requirements: &UserRequirements) -> bool {
        requirements::validate_one(tool, requirements)
    }

    pub fn validate_batch(&self, tools: &[Tool], requirements: &UserRequirements) -> Vec<Tool> {
        requirements::validate_batch(tools, requirements)
    }

    pub async fn score_sentiment(&self, tool: &Tool) -> Result<f64> {
        let analyzer = self
            .sentiment
            .as_deref()
            .ok_or_else(|| AppError::service("sentiment", "no sentiment analyzer configured"))?;
        sentiment::score_sentiment(analyzer, tool).await
    }

    pub async fn fetch_feedback(&self, tool_name: &str) -> Result<Option<Feedback>> {
        self.feedback.lookup(tool_name).await
    }

    pub fn accept_feedback(&self, feedback: &Feedback) -> bool {
        accept_feedback(feedback)
    }

    /// Run every gate the policy enables against one tool.
    ///
    /// Accepted tools carry feedback signals only when their feedback passed
    /// the quality gate.
    pub async fn evaluate(&self, mut tool: Tool, requirements: &UserRequirements) -> Verdict {
        if !self.validate_one(&tool, requirements) {
            return self.reject(tool, Rejection::Requirements);
        }

        if self.policy.require_sentiment {
            let scored = self.score_sentiment(&tool).await;
            match scored {
                Ok(score) if score > POSITIVITY_THRESHOLD => {}
                Ok(score) => return self.reject(tool, Rejection::NotPositive { score }),
                Err(error) => return self.fail(tool, error),
            }
        }

        let lookup = self.fetch_feedback(&tool.name).await;
        let trusted = match lookup {
            Ok(Some(feedback)) if accept_feedback(&feedback) => Some(feedback),
            Ok(Some(feedback)) => {
                tracing::debug!(
                    tool = %tool.name,
                    score = feedback.feedback_score,
                    reviews = feedback.review_count,
                    "Feedback below quality thresholds"
                );
                None
            }
            Ok(None) => None,
            Err(error) if self.policy.require_feedback => return self.fail(tool, error),
            Err(error) => {
                metrics::counter!("gate_failures_total").increment(1);
                tracing::warn!(tool = %tool.name, error = %error, "Feedback lookup failed, continuing without");
                None
            }
        };

        match trusted {
            Some(feedback) => tool.enrich(&feedback),
            None if self.policy.require_feedback => return self.reject(tool, Rejection::Feedback),
            None => {}
        }

        Verdict::Accepted(tool)
    }

    /// Evaluate tools concurrently. One tool's failure never affects another,
    /// and accepted tools keep their input order.
    pub async fn evaluate_batch(&self, tools: Vec<Tool>, requirements: &UserRequirements) -> BatchOutcome {
        let total = tools.len();

        let evaluations: Vec<BoxFuture<'_, Verdict>> = tools
            .into_iter()
            .map(|tool| self.evaluate(tool, requirements).boxed())
            .collect();

        let verdicts: Vec<Verdict> = stream::iter(evaluations)
            .buffered(self.max_concurrency)
            .collect()
            .await;

        let mut outcome = BatchOutcome::default();
        for verdict in verdicts {
            match verdict {
                Verdict::Accepted(tool) => outcome.accepted.push(tool),
                Verdict::Rejected { .. } => outcome.rejected += 1,
                Verdict::Failed { .. } => outcome.failed += 1,
            }
        }

        tracing::debug!(
            total,
            accepted = outcome.accepted.len(),
            rejected = outcome.rejected,
            failed = outcome.failed,
            "Batch validation complete"
        );

        outcome
    }

    fn reject(&self, tool: Tool, reason: Rejection) -> Verdict {
        metrics::counter!("tools_rejected_total").increment(1);
        tracing::debug!(tool = %tool.name, reason = %reason, "Tool rejected");
        Verdict::Rejected {
            tool: tool.name,
            reason,
        }
    }

    fn fail(&self, tool: Tool, error: AppError) -> Verdict {
        metrics::counter!("gate_failures_total").increment(1);
        tracing::warn!(tool = %tool.name, error = %error, "Validation gate failed");
        Verdict::Failed {
            tool: tool.name,
            error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockFeedbackSource, MockSentimentAnalyzer};

    fn tool(name: &str, description: &str) -> Tool {
        Tool::new(name, description, "https://a.example")
    }

    fn any() -> UserRequirements {
        UserRequirements::default()
    }

    #[tokio::test]
    async fn test_keywords_only_policy_skips_services() {
        let analyzer = Arc::new(MockSentimentAnalyzer::new(-1.0));
        let validator = Validator::new(AcceptancePolicy::keywords_only()).with_sentiment(analyzer.clone());

        let verdict = validator.evaluate(tool("a", "memory aid"), &any()).await;
        assert!(matches!(verdict, Verdict::Accepted(_)));
        assert_eq!(analyzer.calls(), 0);
    }

    #[tokio::test]
    async fn test_requirements_checked_before_services() {
        let analyzer = Arc::new(MockSentimentAnalyzer::new(0.9));
        let validator = Validator::new(AcceptancePolicy::default()).with_sentiment(analyzer.clone());

        let verdict = validator
            .evaluate(tool("a", "timer"), &UserRequirements::with_keywords(["memory"]))
            .await;
        assert!(matches!(
            verdict,
            Verdict::Rejected { reason: Rejection::Requirements, .. }
        ));
        assert_eq!(analyzer.calls(), 0);
    }

    #[tokio::test]
    async fn test_sentiment_gate() {
        let analyzer = MockSentimentAnalyzer::new(0.5).with_score("clunky", 0.1);
        let validator = Validator::new(AcceptancePolicy::default()).with_sentiment(Arc::new(analyzer));

        assert!(matches!(
            validator.evaluate(tool("a", "lovely"), &any()).await,
            Verdict::Accepted(_)
        ));
        assert!(matches!(
            validator.evaluate(tool("b", "clunky"), &any()).await,
            Verdict::Rejected { reason: Rejection::NotPositive { .. }, .. }
        ));
    }

    #[tokio::test]
    async fn test_positivity_threshold_is_fixed() {
        let analyzer = MockSentimentAnalyzer::new(0.0)
            .with_score("edge", POSITIVITY_THRESHOLD)
            .with_score("above", 0.11);
        let validator = Validator::new(AcceptancePolicy::default()).with_sentiment(Arc::new(analyzer));

        assert!(matches!(
            validator.evaluate(tool("a", "edge"), &any()).await,
            Verdict::Rejected { reason: Rejection::NotPositive { .. }, .. }
        ));
        assert!(matches!(
            validator.evaluate(tool("b", "above"), &any()).await,
            Verdict::Accepted(_)
        ));
    }

    #[test]
    fn test_evaluate_batch_future_is_send() {
        fn assert_send<T: Send>(_: T) {}
        let validator = Validator::new(AcceptancePolicy::keywords_only());
        let requirements = any();
        assert_send(validator.evaluate_batch(vec![tool("a", "x")], &requirements));
    }

    #[tokio::test]
    async fn test_missing_analyzer_fails_tool() {
        let validator = Validator::new(AcceptancePolicy::default());
        let verdict = validator.evaluate(tool("a", "x"), &any()).await;
        assert!(matches!(
            verdict,
            Verdict::Failed { error: AppError::ServiceFailure { service: "sentiment", .. }, .. }
        ));
    }

    #[tokio::test]
    async fn test_trusted_feedback_enriches_tool() {
        let feedback = MockFeedbackSource::new()
            .with_feedback("good", 4.4, 50)
            .with_feedback("weak", 3.2, 50);
        let validator = Validator::new(AcceptancePolicy::keywords_only()).with_feedback(Arc::new(feedback));

        let Verdict::Accepted(good) = validator.evaluate(tool("good", "x"), &any()).await else {
            panic!("expected acceptance");
        };
        assert_eq!(good.feedback_score, Some(4.4));
        assert_eq!(good.review_count, Some(50));

        let Verdict::Accepted(weak) = validator.evaluate(tool("weak", "x"), &any()).await else {
            panic!("expected acceptance");
        };
        assert_eq!(weak.feedback_score, None);
    }

    #[tokio::test]
    async fn test_required_feedback_gate() {
        let policy = AcceptancePolicy {
            require_sentiment: false,
            require_feedback: true,
        };
        let feedback = MockFeedbackSource::new()
            .with_feedback("good", 4.0, 10)
            .with_feedback("few", 5.0, 9)
            .with_failure("broken");
        let validator = Validator::new(policy).with_feedback(Arc::new(feedback));

        assert!(matches!(
            validator.evaluate(tool("good", "x"), &any()).await,
            Verdict::Accepted(_)
        ));
        assert!(matches!(
            validator.evaluate(tool("few", "x"), &any()).await,
            Verdict::Rejected { reason: Rejection::Feedback, .. }
        ));
        assert!(matches!(
            validator.evaluate(tool("unknown", "x"), &any()).await,
            Verdict::Rejected { reason: Rejection::Feedback, .. }
        ));
        assert!(matches!(
            validator.evaluate(tool("broken", "x"), &any()).await,
            Verdict::Failed { .. }
        ));
    }

    #[tokio::test]
    async fn test_optional_feedback_failure_still_accepts() {
        let feedback = MockFeedbackSource::new().with_failure("flaky");
        let validator = Validator::new(AcceptancePolicy::keywords_only()).with_feedback(Arc::new(feedback));

        assert!(matches!(
            validator.evaluate(tool("flaky", "x"), &any()).await,
            Verdict::Accepted(_)
        ));
    }

    #[tokio::test]
    async fn test_batch_isolates_failures_and_keeps_order() {
        let analyzer = MockSentimentAnalyzer::new(0.6)
            .with_failure("timeout")
            .with_score("gloomy", -0.4);
        let validator = Validator::new(AcceptancePolicy::default())
            .with_sentiment(Arc::new(analyzer))
            .with_max_concurrency(3);

        let tools = vec![
            tool("a", "bright memory tool"),
            tool("b", "timeout memory tool"),
            tool("c", "gloomy memory tool"),
            tool("d", "plain memory tool"),
            tool("e", "unrelated"),
        ];
        let outcome = validator
            .evaluate_batch(tools, &UserRequirements::with_keywords(["memory"]))
            .await;

        let names: Vec<_> = outcome.accepted.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["a", "d"]);
        assert_eq!(outcome.failed, 1);
        assert_eq!(outcome.rejected, 2);
    }
}
