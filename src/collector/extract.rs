//! Tool card extraction from HTML markup.

use crate::error::{AppError, Result};
use crate::model::Tool;
use scraper::{ElementRef, Html, Selector};

/// One extracted entry. Either field may be absent in malformed markup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCard {
    pub name: Option<String>,
    pub description: Option<String>,
}

impl ToolCard {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            description: Some(description.into()),
        }
    }

    /// Convert into a collected tool tagged with `source`.
    ///
    /// Fails with `ExtractionMalformed` when a required field is absent or blank.
    pub fn into_tool(self, source: &str) -> Result<Tool> {
        let name = self.name.filter(|n| !n.is_empty()).ok_or_else(|| {
            AppError::ExtractionMalformed(format!("tool card from {} has no name", source))
        })?;
        let description = self.description.filter(|d| !d.is_empty()).ok_or_else(|| {
            AppError::ExtractionMalformed(format!(
                "tool card '{}' from {} has no description",
                name, source
            ))
        })?;
        Ok(Tool::new(name, description, source))
    }
}

pub trait MarkupExtractor: Send + Sync {
    fn extract_tool_cards(&self, body: &str) -> Vec<ToolCard>;
}

/// Reads `div.tool-card` elements: name from the first `h3`, description
/// from the first `p`.
pub struct ToolCardExtractor {
    card: Selector,
    name: Selector,
    description: Selector,
}

impl ToolCardExtractor {
    pub fn new() -> Result<Self> {
        Self::with_selectors("div.tool-card", "h3", "p")
    }

    pub fn with_selectors(card: &str, name: &str, description: &str) -> Result<Self> {
        Ok(Self {
            card: parse_selector(card)?,
            name: parse_selector(name)?,
            description: parse_selector(description)?,
        })
    }
}

impl MarkupExtractor for ToolCardExtractor {
    fn extract_tool_cards(&self, body: &str) -> Vec<ToolCard> {
        let document = Html::parse_document(body);

        document
            .select(&self.card)
            .map(|card| ToolCard {
                name: first_text(card, &self.name),
                description: first_text(card, &self.description),
            })
            .collect()
    }
}

fn parse_selector(css: &str) -> Result<Selector> {
    Selector::parse(css)
        .map_err(|e| AppError::ValidationError(format!("Invalid selector '{}': {:?}", css, e)))
}

fn first_text(element: ElementRef<'_>, selector: &Selector) -> Option<String> {
    element
        .select(selector)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
}
