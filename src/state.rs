use crate::collector::{Collector, DriverConfig, HttpFetcher, Renderer, ToolCardExtractor, WebDriverProvider};
use crate::config::Config;
use crate::error::Result;
use crate::pipeline::Pipeline;
use crate::recommender::Recommender;
use crate::validator::{HttpSentimentAnalyzer, StaticFeedbackStore, Validator};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Application state shared across all request handlers.
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
    /// Set once startup collaborator checks pass
    pub ready: AtomicBool,
    pub config: Arc<Config>,
}

impl AppState {
    /// Build the HTTP-backed collaborators described by `config`.
    pub fn new(config: Config) -> Result<Self> {
        let timeout = Duration::from_secs(config.fetch_timeout_secs);

        let mut collector = Collector::new(
            Arc::new(HttpFetcher::new(timeout)?),
            Arc::new(ToolCardExtractor::new()?),
        )
        .with_max_concurrency(config.max_concurrency);

        if let Some(endpoint) = &config.webdriver_url {
            collector = collector.with_renderer(Renderer {
                provider: Arc::new(WebDriverProvider::new(timeout)?),
                config: DriverConfig::new(endpoint.as_str()),
            });
            tracing::info!(endpoint = %endpoint, "Dynamic rendering enabled");
        }

        let feedback = match &config.feedback_path {
            Some(path) => StaticFeedbackStore::load(path)?,
            None => StaticFeedbackStore::default(),
        };

        let mut validator = Validator::new(config.policy)
            .with_feedback(Arc::new(feedback))
            .with_max_concurrency(config.max_concurrency);

        if let Some(url) = &config.sentiment_url {
            validator = validator.with_sentiment(Arc::new(HttpSentimentAnalyzer::new(url.as_str(), timeout)?));
        }

        tracing::info!(
            require_sentiment = config.policy.require_sentiment,
            require_feedback = config.policy.require_feedback,
            missing_score = config.ranking.missing_score,
            "Acceptance policy configured"
        );

        let recommender = Recommender::new(config.ranking);
        Ok(Self::from_parts(config, Pipeline::new(collector, validator, recommender)))
    }

    /// Wrap an already assembled pipeline, e.g. one with mock collaborators.
    pub fn from_parts(config: Config, pipeline: Pipeline) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            ready: AtomicBool::new(false),
            config: Arc::new(config),
        }
    }

    /// Check collaborators that must be reachable before serving traffic.
    pub async fn check_collaborators(&self) -> Result<()> {
        self.pipeline.collector.check_renderer().await
    }

    pub fn mark_ready(&self) {
        self.ready.store(true, Ordering::SeqCst);
    }

    /// Check if the service is ready to handle requests.
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }
}
