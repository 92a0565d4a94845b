//! Crawler-facing documents.

mod gone;
mod job;
mod structured;

pub use gone::*;
pub use job::*;
pub use structured::*;

/// Suffix of every page title.
pub const SITE_NAME: &str = "Job Board";

/// Content type of rendered documents.
pub const HTML_CONTENT_TYPE: &str = "text/html; charset=utf-8";

/// A complete HTML document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedDocument {
    pub html: String,
    pub content_type: &'static str,
}

impl RenderedDocument {
    pub fn html(html: String) -> Self {
        Self {
            html,
            content_type: HTML_CONTENT_TYPE,
        }
    }
}

/// Rendering failed; nothing partial is ever returned.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RenderError {
    #[error("structured data serialization failed: {0}")]
    StructuredData(String),
}
