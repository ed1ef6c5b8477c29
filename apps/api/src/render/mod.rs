//! Document renderer collaborator: turns drafted letter text into a downloadable document.

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

use crate::models::{DocumentHandle, LetterStyle};

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Nothing to render")]
    EmptyDocument,
}

#[async_trait]
pub trait DocumentRenderer: Send + Sync {
    async fn render(&self, text: &str, style: LetterStyle) -> Result<DocumentHandle, RenderError>;
}

pub const MARKDOWN_CONTENT_TYPE: &str = "text/markdown";
const MARKDOWN_FILENAME: &str = "cover_letters.md";

/// Renders the letters as a single Markdown file.
pub struct MarkdownRenderer;

#[async_trait]
impl DocumentRenderer for MarkdownRenderer {
    async fn render(&self, text: &str, style: LetterStyle) -> Result<DocumentHandle, RenderError> {
        let body = text.trim();
        if body.is_empty() {
            return Err(RenderError::EmptyDocument);
        }
        let document = format!("# Cover letters\n\n_Style: {style}_\n\n{body}\n");
        Ok(DocumentHandle::new(
            MARKDOWN_FILENAME,
            MARKDOWN_CONTENT_TYPE,
            Bytes::from(document),
        ))
    }
}
