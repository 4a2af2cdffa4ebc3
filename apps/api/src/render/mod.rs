//! Document rendering: one pure mapping from a CV snapshot to a `Document`,
//! and the sinks that present it.
//!
//! Sinks never look at the `CvRecord`. They receive the `Document`, lay it out
//! with `layout::paginate`, and differ only in the bytes they write.

pub mod document;
pub mod html;
pub mod pdf;

use thiserror::Error;

pub use document::{render, Document};
pub use html::HtmlPreview;
pub use pdf::PdfExport;

/// Filename offered for every exported CV.
pub const EXPORT_FILENAME: &str = "cv.pdf";

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("template error: {0}")]
    Template(#[from] tera::Error),

    #[error("PDF generation failed: {0}")]
    Pdf(String),
}

/// A presentation device for a rendered `Document`.
pub trait DocumentSink: Send + Sync {
    fn content_type(&self) -> &'static str;

    fn write(&self, document: &Document) -> Result<Vec<u8>, RenderError>;
}
