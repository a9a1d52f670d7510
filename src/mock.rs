//! Scripted in-memory collaborators for tests and local runs.

use crate::collector::{DriverConfig, FetchResponse, Fetcher, RenderSession, RenderSessionProvider};
use crate::error::{AppError, Result};
use crate::model::Feedback;
use crate::validator::{FeedbackSource, SentimentAnalyzer, SentimentScore};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Serves canned pages keyed by URL. Unknown URLs fail as unreachable.
#[derive(Default)]
pub struct MockFetcher {
    responses: HashMap<String, Option<FetchResponse>>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, url: impl Into<String>, body: impl Into<String>) -> Self {
        self.responses
            .insert(url.into(), Some(FetchResponse::ok(body)));
        self
    }

    pub fn with_status(mut self, url: impl Into<String>, status: u16) -> Self {
        self.responses.insert(
            url.into(),
            Some(FetchResponse {
                status,
                body: String::new(),
            }),
        );
        self
    }

    pub fn with_error(mut self, url: impl Into<String>) -> Self {
        self.responses.insert(url.into(), None);
        self
    }
}

#[async_trait]
impl Fetcher for MockFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchResponse> {
        match self.responses.get(url) {
            Some(Some(response)) => Ok(response.clone()),
            Some(None) => Err(AppError::unreachable(url, "connection refused")),
            None => Err(AppError::unreachable(url, "no such host")),
        }
    }
}

/// Browser stand-in that counts session opens and closes.
#[derive(Default)]
pub struct MockRenderProvider {
    pages: HashMap<String, String>,
    stalled: HashSet<String>,
    fail_open: bool,
    opened: Arc<AtomicUsize>,
    closed: Arc<AtomicUsize>,
}

impl MockRenderProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// A provider whose sessions can never be opened.
    pub fn failing() -> Self {
        Self {
            fail_open: true,
            ..Self::default()
        }
    }

    pub fn with_page(mut self, url: impl Into<String>, body: impl Into<String>) -> Self {
        self.pages.insert(url.into(), body.into());
        self
    }

    /// Rendering `url` never completes.
    pub fn with_stall(mut self, url: impl Into<String>) -> Self {
        self.stalled.insert(url.into());
        self
    }

    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RenderSessionProvider for MockRenderProvider {
    async fn open_session(&self, _config: &DriverConfig) -> Result<Box<dyn RenderSession>> {
        if self.fail_open {
            return Err(AppError::ResourceAcquisitionFailure(
                "browser failed to start".into(),
            ));
        }
        self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockRenderSession {
            pages: self.pages.clone(),
            stalled: self.stalled.clone(),
            closed: Arc::clone(&self.closed),
        }))
    }

    async fn check(&self, _config: &DriverConfig) -> Result<()> {
        if self.fail_open {
            return Err(AppError::ResourceAcquisitionFailure("browser unavailable".into()));
        }
        Ok(())
    }
}

struct MockRenderSession {
    pages: HashMap<String, String>,
    stalled: HashSet<String>,
    closed: Arc<AtomicUsize>,
}

#[async_trait]
impl RenderSession for MockRenderSession {
    async fn render(&mut self, url: &str) -> Result<FetchResponse> {
        if self.stalled.contains(url) {
            futures::future::pending::<()>().await;
        }
        Ok(match self.pages.get(url) {
            Some(body) => FetchResponse::ok(body.clone()),
            None => FetchResponse {
                status: 404,
                body: String::new(),
            },
        })
    }

    async fn close(&mut self) -> Result<()> {
        self.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Scores text by the first matching substring rule, else a default score.
pub struct MockSentimentAnalyzer {
    rules: Vec<(String, Option<f64>)>,
    default_score: f64,
    calls: AtomicUsize,
}

impl MockSentimentAnalyzer {
    pub fn new(default_score: f64) -> Self {
        Self {
            rules: Vec::new(),
            default_score,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_score(mut self, needle: impl Into<String>, score: f64) -> Self {
        self.rules.push((needle.into(), Some(score)));
        self
    }

    /// Texts containing `needle` fail as a service error.
    pub fn with_failure(mut self, needle: impl Into<String>) -> Self {
        self.rules.push((needle.into(), None));
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SentimentAnalyzer for MockSentimentAnalyzer {
    async fn analyze_sentiment(&self, text: &str) -> Result<SentimentScore> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let rule = self.rules.iter().find(|(needle, _)| text.contains(needle.as_str()));
        match rule {
            Some((_, Some(score))) => Ok(SentimentScore { score: *score }),
            Some((_, None)) => Err(AppError::service("sentiment", "request timed out")),
            None => Ok(SentimentScore {
                score: self.default_score,
            }),
        }
    }
}

/// Feedback lookup with per-name failures.
#[derive(Default)]
pub struct MockFeedbackSource {
    records: HashMap<String, Feedback>,
    failing: HashSet<String>,
}

impl MockFeedbackSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_feedback(mut self, name: impl Into<String>, score: f64, reviews: u32) -> Self {
        let name = name.into();
        self.records.insert(
            name.clone(),
            Feedback {
                name,
                feedback_score: score,
                review_count: reviews,
            },
        );
        self
    }

    pub fn with_failure(mut self, name: impl Into<String>) -> Self {
        self.failing.insert(name.into());
        self
    }
}

#[async_trait]
impl FeedbackSource for MockFeedbackSource {
    async fn lookup(&self, tool_name: &str) -> Result<Option<Feedback>> {
        if self.failing.contains(tool_name) {
            return Err(AppError::service("feedback", "malformed response"));
        }
        Ok(self.records.get(tool_name).cloned())
    }
}
