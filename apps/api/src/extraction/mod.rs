//! Extraction Gateway: turns an uploaded PDF into the model's raw answer text.
//!
//! The gateway never parses the answer. Whatever comes back (valid JSON,
//! fenced JSON, prose) is handed to `cv::normalize` as-is.

pub mod upload;

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;
use tracing::{info, warn};

use crate::llm_client::prompts::CV_PARSE_SYSTEM;
use crate::llm_client::{LlmClient, LlmError};

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("could not read text from the PDF: {0}")]
    UnreadablePdf(String),

    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error("text extraction task failed: {0}")]
    Task(String),
}

/// Source of raw CV text for one uploaded PDF.
///
/// Tests swap in a stub; production uses `MistralGateway`.
#[async_trait]
pub trait ExtractionGateway: Send + Sync {
    async fn extract(&self, pdf: &Path) -> Result<String, ExtractionError>;
}

/// `pdf-extract` for the text layer, Mistral chat completion for structure.
pub struct MistralGateway {
    llm: LlmClient,
}

impl MistralGateway {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl ExtractionGateway for MistralGateway {
    async fn extract(&self, pdf: &Path) -> Result<String, ExtractionError> {
        let text = extract_pdf_text(pdf.to_path_buf()).await?;

        if text.trim().is_empty() {
            warn!("PDF has no text layer, skipping model call");
            return Ok(String::new());
        }

        info!(
            "Extracted {} chars of PDF text, calling {}",
            text.len(),
            self.llm.model()
        );
        Ok(self.llm.call_text(&text, CV_PARSE_SYSTEM).await?)
    }
}

/// Runs `pdf-extract` off the async executor. A panic inside the parser is
/// reported as an unreadable PDF.
async fn extract_pdf_text(path: PathBuf) -> Result<String, ExtractionError> {
    tokio::task::spawn_blocking(move || pdf_extract::extract_text(&path))
        .await
        .map_err(|e| {
            if e.is_panic() {
                ExtractionError::UnreadablePdf("PDF parser panicked".to_string())
            } else {
                ExtractionError::Task(e.to_string())
            }
        })?
        .map_err(|e| ExtractionError::UnreadablePdf(e.to_string()))
}
