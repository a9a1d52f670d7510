use crate::error::{AppError, Result};
use crate::model::Tool;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default positivity threshold: a description is positive above this score.
pub const POSITIVITY_THRESHOLD: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SentimentScore {
    pub score: f64,
}

impl SentimentScore {
    pub fn is_positive(&self, threshold: f64) -> bool {
        self.score > threshold
    }
}

#[async_trait]
pub trait SentimentAnalyzer: Send + Sync {
    async fn analyze_sentiment(&self, text: &str) -> Result<SentimentScore>;
}

/// Score a tool's description with the analyzer.
pub async fn score_sentiment(analyzer: &dyn SentimentAnalyzer, tool: &Tool) -> Result<f64> {
    analyzer
        .analyze_sentiment(&tool.description)
        .await
        .map(|s| s.score)
}

/// Sentiment service reached over HTTP.
///
/// POSTs `{"text": ...}` and expects `{"score": <float>}` back.
pub struct HttpSentimentAnalyzer {
    client: reqwest::Client,
    endpoint: String,
}

#[derive(Serialize)]
struct SentimentRequest<'a> {
    text: &'a str,
}

impl HttpSentimentAnalyzer {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                AppError::ResourceAcquisitionFailure(format!("Failed to build sentiment client: {}", e))
            })?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait]
impl SentimentAnalyzer for HttpSentimentAnalyzer {
    async fn analyze_sentiment(&self, text: &str) -> Result<SentimentScore> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&SentimentRequest { text })
            .send()
            .await
            .map_err(|e| AppError::service("sentiment", e))?;

        if !response.status().is_success() {
            return Err(AppError::service(
                "sentiment",
                format!("HTTP status {}", response.status()),
            ));
        }

        let score: SentimentScore = response
            .json()
            .await
            .map_err(|e| AppError::service("sentiment", format!("malformed response: {}", e)))?;

        if !score.score.is_finite() {
            return Err(AppError::service("sentiment", "non-finite score"));
        }

        Ok(score)
    }
}
