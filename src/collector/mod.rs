//! Collection stage: turns source documents into tool candidates.
//!
//! The network client, markup parser and browser automation are collaborators
//! behind traits; [`Collector`] only decides what to keep and what to skip.

pub mod extract;
pub mod fetch;
pub mod gather;
pub mod render;

pub use extract::{MarkupExtractor, ToolCard, ToolCardExtractor};
pub use fetch::{FetchResponse, Fetcher, HttpFetcher};
pub use gather::{Collection, Collector, Renderer};
pub use render::{DriverConfig, RenderSession, RenderSessionProvider, WebDriverProvider};
