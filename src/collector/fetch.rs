use crate::error::{AppError, Result};
use async_trait::async_trait;
use std::time::Duration;

/// Raw response for one source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    pub status: u16,
    pub body: String,
}

impl FetchResponse {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    /// Only a plain 200 counts as success; redirects and 204s are skipped.
    pub fn is_success(&self) -> bool {
        self.status == 200
    }
}

#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Retrieve a source. Transport errors surface as `SourceUnreachable`.
    async fn fetch(&self, url: &str) -> Result<FetchResponse>;
}

/// `reqwest`-backed fetcher for static pages.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("toolscout/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                AppError::ResourceAcquisitionFailure(format!("Failed to build HTTP client: {}", e))
            })?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchResponse> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| AppError::unreachable(url, e))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| AppError::unreachable(url, format!("failed to read body: {}", e)))?;

        Ok(FetchResponse { status, body })
    }
}
