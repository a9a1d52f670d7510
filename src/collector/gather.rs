use crate::collector::extract::MarkupExtractor;
use crate::collector::fetch::{FetchResponse, Fetcher};
use crate::collector::render::{DriverConfig, RenderSession, RenderSessionProvider};
use crate::error::{AppError, Result};
use crate::model::{SourceDescriptor, Tool};
use futures::future::{BoxFuture, FutureExt};
use futures::stream::{self, StreamExt};
use std::sync::Arc;

/// Browser provider plus the driver settings it is opened with.
pub struct Renderer {
    pub provider: Arc<dyn RenderSessionProvider>,
    pub config: DriverConfig,
}

/// Result of one collection pass.
#[derive(Debug, Default)]
pub struct Collection {
    /// Tools in source order, then page order. Not deduplicated.
    pub tools: Vec<Tool>,
    pub sources_skipped: usize,
    pub entries_dropped: usize,
}

pub struct Collector {
    fetcher: Arc<dyn Fetcher>,
    extractor: Arc<dyn MarkupExtractor>,
    renderer: Option<Renderer>,
    max_concurrency: usize,
}

/// Per-source outcome: extracted tools and dropped entry count, or skipped.
type SourceOutcome = Option<(Vec<Tool>, usize)>;

impl Collector {
    pub fn new(fetcher: Arc<dyn Fetcher>, extractor: Arc<dyn MarkupExtractor>) -> Self {
        Self {
            fetcher,
            extractor,
            renderer: None,
            max_concurrency: 8,
        }
    }

    pub fn with_renderer(mut self, renderer: Renderer) -> Self {
        self.renderer = Some(renderer);
        self
    }

    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    /// Gather tool candidates from every source.
    ///
    /// Unreachable sources are logged and skipped. The only fatal error is
    /// failing to open the browser session when dynamic sources are present.
    pub async fn gather(&self, sources: &[SourceDescriptor]) -> Result<Vec<Tool>> {
        Ok(self.collect(sources).await?.tools)
    }

    /// Like [`Collector::gather`], also counting skipped sources and dropped entries.
    pub async fn collect(&self, sources: &[SourceDescriptor]) -> Result<Collection> {
        let mut session = if sources.iter().any(SourceDescriptor::is_dynamic) {
            Some(SessionGuard::new(self.open_session().await?))
        } else {
            None
        };

        let mut outcomes = self.collect_static(sources).await;

        if let Some(guard) = session.as_mut() {
            for (idx, source) in sources.iter().enumerate() {
                if source.is_dynamic() {
                    let response = guard.render(source.url()).await;
                    outcomes[idx] = self.extract(source, response);
                }
            }
        }

        // Released after the whole pass, whatever the per-source results were
        if let Some(guard) = session {
            guard.close().await;
        }

        let mut collection = Collection::default();
        for outcome in outcomes {
            match outcome {
                Some((tools, dropped)) => {
                    collection.tools.extend(tools);
                    collection.entries_dropped += dropped;
                }
                None => collection.sources_skipped += 1,
            }
        }

        metrics::counter!("tools_collected_total").increment(collection.tools.len() as u64);
        metrics::counter!("sources_skipped_total").increment(collection.sources_skipped as u64);

        tracing::info!(
            sources = sources.len(),
            skipped = collection.sources_skipped,
            dropped = collection.entries_dropped,
            tools = collection.tools.len(),
            "Collection pass complete"
        );

        Ok(collection)
    }

    /// Check the render driver, if one is configured.
    pub async fn check_renderer(&self) -> Result<()> {
        match &self.renderer {
            Some(renderer) => renderer.provider.check(&renderer.config).await,
            None => Ok(()),
        }
    }

    async fn open_session(&self) -> Result<Box<dyn RenderSession>> {
        let renderer = self.renderer.as_ref().ok_or_else(|| {
            AppError::ResourceAcquisitionFailure(
                "dynamic sources requested but no render session provider configured".into(),
            )
        })?;

        renderer
            .provider
            .open_session(&renderer.config)
            .await
            .map_err(|e| match e {
                AppError::ResourceAcquisitionFailure(_) => e,
                other => AppError::ResourceAcquisitionFailure(other.to_string()),
            })
    }

    /// Fetch static sources concurrently. Dynamic slots are left as `None`
    /// for the caller to fill.
    async fn collect_static(&self, sources: &[SourceDescriptor]) -> Vec<SourceOutcome> {
        let fetches: Vec<BoxFuture<'_, SourceOutcome>> = sources
            .iter()
            .map(|source| self.fetch_static(source).boxed())
            .collect();

        stream::iter(fetches)
            .buffered(self.max_concurrency)
            .collect()
            .await
    }

    async fn fetch_static(&self, source: &SourceDescriptor) -> SourceOutcome {
        match source {
            SourceDescriptor::Static(url) => {
                let response = self.fetcher.fetch(url).await;
                self.extract(source, response)
            }
            SourceDescriptor::Dynamic(_) => None,
        }
    }

    fn extract(&self, source: &SourceDescriptor, response: Result<FetchResponse>) -> SourceOutcome {
        let url = source.url();

        let body = match response {
            Ok(response) if response.is_success() => response.body,
            Ok(response) => {
                let err = AppError::unreachable(url, format!("HTTP status {}", response.status));
                tracing::warn!(source = %source, error = %err, "Skipping source");
                return None;
            }
            Err(e) => {
                tracing::warn!(source = %source, error = %e, "Skipping source");
                return None;
            }
        };

        let cards = self.extractor.extract_tool_cards(&body);
        let total = cards.len();
        let mut tools = Vec::with_capacity(total);

        for card in cards {
            match card.into_tool(url) {
                Ok(tool) => tools.push(tool),
                Err(e) => tracing::warn!(source = %source, error = %e, "Dropping tool card"),
            }
        }

        tracing::debug!(source = %source, total, kept = tools.len(), "Source extracted");

        let dropped = total - tools.len();
        Some((tools, dropped))
    }
}

/// Owns the render session for one pass.
///
/// `close` is the normal release path. If the pass is dropped before that,
/// for example when the request is cancelled, the session is closed on a
/// background task instead.
struct SessionGuard {
    session: Option<Box<dyn RenderSession>>,
}

impl SessionGuard {
    fn new(session: Box<dyn RenderSession>) -> Self {
        Self {
            session: Some(session),
        }
    }

    async fn render(&mut self, url: &str) -> Result<FetchResponse> {
        match self.session.as_mut() {
            Some(session) => session.render(url).await,
            None => Err(AppError::unreachable(url, "render session already closed")),
        }
    }

    async fn close(mut self) {
        if let Some(mut session) = self.session.take() {
            if let Err(e) = session.close().await {
                tracing::error!(error = %e, "Failed to close render session");
            }
        }
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        let Some(mut session) = self.session.take() else {
            return;
        };

        tracing::warn!("Collection pass cancelled, closing render session in background");
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    if let Err(e) = session.close().await {
                        tracing::error!(error = %e, "Failed to close render session");
                    }
                });
            }
            Err(_) => tracing::error!("No runtime left to close render session"),
        }
    }
}
