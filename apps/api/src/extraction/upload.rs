//! Upload staging: reads the `cv` multipart field, validates it, and parks it
//! in a named temp file for the gateway.
//!
//! The temp file is owned by the caller and removed by `discard` (or on drop)
//! once the extraction attempt is over.

use std::io::Write;
use std::path::Path;

use axum::extract::multipart::{Multipart, MultipartError};
use axum::http::StatusCode;
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, warn};

pub const FIELD_NAME: &str = "cv";
pub const PDF_CONTENT_TYPE: &str = "application/pdf";
const PDF_MAGIC: &[u8] = b"%PDF-";

/// Room for multipart boundaries and part headers on top of the file limit.
pub const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("no file uploaded in field '{FIELD_NAME}'")]
    MissingFile,

    #[error("exactly one file must be uploaded in field '{FIELD_NAME}'")]
    MultipleFiles,

    #[error("only PDF files are accepted (got '{0}')")]
    UnsupportedType(String),

    #[error("file exceeds the {limit} byte upload limit")]
    TooLarge { limit: usize },

    #[error("file is not a PDF document")]
    NotAPdf,

    #[error("malformed multipart body: {0}")]
    Malformed(String),

    #[error("could not stage upload: {0}")]
    Io(#[from] std::io::Error),
}

impl UploadError {
    fn from_multipart(e: MultipartError, limit: usize) -> Self {
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            UploadError::TooLarge { limit }
        } else {
            UploadError::Malformed(e.body_text())
        }
    }
}

/// Reads the single PDF from `multipart` into a temp file under `upload_dir`.
///
/// Rejects a missing or duplicated `cv` field, a non-PDF content type, a body
/// over `max_bytes`, and content without the `%PDF-` header. Other fields are
/// ignored.
pub async fn stage_upload(
    multipart: &mut Multipart,
    upload_dir: &Path,
    max_bytes: usize,
) -> Result<NamedTempFile, UploadError> {
    let mut contents: Option<Vec<u8>> = None;

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| UploadError::from_multipart(e, max_bytes))?
    {
        if field.name() != Some(FIELD_NAME) {
            continue;
        }
        if contents.is_some() {
            return Err(UploadError::MultipleFiles);
        }

        let content_type = field.content_type().unwrap_or_default().to_string();
        if content_type != PDF_CONTENT_TYPE {
            return Err(UploadError::UnsupportedType(content_type));
        }

        let mut buf = Vec::new();
        while let Some(chunk) = field
            .chunk()
            .await
            .map_err(|e| UploadError::from_multipart(e, max_bytes))?
        {
            if buf.len() + chunk.len() > max_bytes {
                return Err(UploadError::TooLarge { limit: max_bytes });
            }
            buf.extend_from_slice(&chunk);
        }
        contents = Some(buf);
    }

    let contents = contents.ok_or(UploadError::MissingFile)?;
    if contents.is_empty() {
        return Err(UploadError::MissingFile);
    }
    if !contents.starts_with(PDF_MAGIC) {
        return Err(UploadError::NotAPdf);
    }

    let size = contents.len();
    let dir = upload_dir.to_path_buf();
    let file = tokio::task::spawn_blocking(move || write_staged(&dir, &contents))
        .await
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))??;
    debug!("Staged {size} byte upload at {}", file.path().display());
    Ok(file)
}

fn write_staged(dir: &Path, contents: &[u8]) -> std::io::Result<NamedTempFile> {
    let mut file = tempfile::Builder::new()
        .prefix("cv-")
        .suffix(".pdf")
        .tempfile_in(dir)?;
    file.write_all(contents)?;
    file.flush()?;
    Ok(file)
}

/// Removes a staged upload. Failure is logged, never surfaced to the client.
pub fn discard(file: NamedTempFile) {
    let path = file.path().to_path_buf();
    if let Err(e) = file.close() {
        warn!("Failed to remove staged upload {}: {e}", path.display());
    }
}
