//! Browser rendering for dynamic sources.
//!
//! A session is single-owner: the collector opens one per collection pass,
//! renders every dynamic source through it in turn, and closes it afterwards.

use crate::collector::fetch::FetchResponse;
use crate::error::{AppError, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverConfig {
    /// WebDriver endpoint, e.g. `http://localhost:9515`
    pub endpoint: String,
    pub browser: String,
    pub headless: bool,
}

impl DriverConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            browser: "chrome".to_string(),
            headless: true,
        }
    }
}

#[async_trait]
pub trait RenderSession: Send {
    /// Navigate to `url` and return the rendered page source.
    async fn render(&mut self, url: &str) -> Result<FetchResponse>;

    async fn close(&mut self) -> Result<()>;
}

#[async_trait]
pub trait RenderSessionProvider: Send + Sync {
    async fn open_session(&self, config: &DriverConfig) -> Result<Box<dyn RenderSession>>;

    /// Whether the driver can accept new sessions.
    async fn check(&self, _config: &DriverConfig) -> Result<()> {
        Ok(())
    }
}

/// Drives a browser through the W3C WebDriver JSON protocol.
pub struct WebDriverProvider {
    client: reqwest::Client,
}

impl WebDriverProvider {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                AppError::ResourceAcquisitionFailure(format!("Failed to build WebDriver client: {}", e))
            })?;
        Ok(Self { client })
    }
}

#[derive(Deserialize)]
struct WebDriverReply<T> {
    value: T,
}

#[derive(Deserialize)]
struct DriverStatus {
    ready: bool,
    #[serde(default)]
    message: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct NewSession {
    session_id: String,
}

#[async_trait]
impl RenderSessionProvider for WebDriverProvider {
    async fn open_session(&self, config: &DriverConfig) -> Result<Box<dyn RenderSession>> {
        let args: Vec<&str> = if config.headless { vec!["--headless"] } else { vec![] };
        let capabilities = json!({
            "capabilities": {
                "alwaysMatch": {
                    "browserName": config.browser,
                    "goog:chromeOptions": { "args": args }
                }
            }
        });

        let response = self
            .client
            .post(format!("{}/session", config.endpoint))
            .json(&capabilities)
            .send()
            .await
            .map_err(|e| {
                AppError::ResourceAcquisitionFailure(format!("WebDriver unreachable: {}", e))
            })?;

        if !response.status().is_success() {
            return Err(AppError::ResourceAcquisitionFailure(format!(
                "WebDriver refused session: HTTP {}",
                response.status()
            )));
        }

        let reply: WebDriverReply<NewSession> = response.json().await.map_err(|e| {
            AppError::ResourceAcquisitionFailure(format!("Malformed WebDriver session reply: {}", e))
        })?;

        tracing::info!(
            endpoint = %config.endpoint,
            session_id = %reply.value.session_id,
            "WebDriver session opened"
        );

        Ok(Box::new(WebDriverSession {
            client: self.client.clone(),
            base: format!("{}/session/{}", config.endpoint, reply.value.session_id),
            closed: false,
        }))
    }

    async fn check(&self, config: &DriverConfig) -> Result<()> {
        let response = self
            .client
            .get(format!("{}/status", config.endpoint))
            .send()
            .await
            .map_err(|e| {
                AppError::ResourceAcquisitionFailure(format!("WebDriver unreachable: {}", e))
            })?;

        let reply: WebDriverReply<DriverStatus> = response.json().await.map_err(|e| {
            AppError::ResourceAcquisitionFailure(format!("Malformed WebDriver status reply: {}", e))
        })?;

        if !reply.value.ready {
            return Err(AppError::ResourceAcquisitionFailure(format!(
                "WebDriver not ready: {}",
                reply.value.message
            )));
        }
        Ok(())
    }
}

struct WebDriverSession {
    client: reqwest::Client,
    base: String,
    closed: bool,
}

#[async_trait]
impl RenderSession for WebDriverSession {
    async fn render(&mut self, url: &str) -> Result<FetchResponse> {
        let navigate = self
            .client
            .post(format!("{}/url", self.base))
            .json(&json!({ "url": url }))
            .send()
            .await
            .map_err(|e| AppError::unreachable(url, e))?;

        if !navigate.status().is_success() {
            return Ok(FetchResponse {
                status: navigate.status().as_u16(),
                body: String::new(),
            });
        }

        let source = self
            .client
            .get(format!("{}/source", self.base))
            .send()
            .await
            .map_err(|e| AppError::unreachable(url, e))?;

        let status = source.status().as_u16();
        let reply: WebDriverReply<Value> = source
            .json()
            .await
            .map_err(|e| AppError::unreachable(url, format!("malformed page source: {}", e)))?;

        Ok(FetchResponse {
            status,
            body: reply.value.as_str().unwrap_or_default().to_string(),
        })
    }

    async fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        let response = self
            .client
            .delete(&self.base)
            .send()
            .await
            .map_err(|e| AppError::service("webdriver", e))?;

        if !response.status().is_success() {
            return Err(AppError::service(
                "webdriver",
                format!("session delete returned HTTP {}", response.status()),
            ));
        }

        tracing::info!(session = %self.base, "WebDriver session closed");
        Ok(())
    }
}
