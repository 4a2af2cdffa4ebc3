use std::sync::Arc;

use axum::{
    extract::{Multipart, State},
    http::header,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    Json,
};
use serde::Serialize;
use serde_json::Value;
use tokio_stream::{wrappers::WatchStream, Stream, StreamExt};
use tracing::info;

use crate::cv::models::CvRecord;
use crate::cv::normalize::{normalize, normalize_record, normalize_response};
use crate::cv::store::{Action, SessionState, StoreError};
use crate::errors::AppError;
use crate::extraction::upload::{discard, stage_upload};
use crate::render::{render, Document, DocumentSink, PdfExport, EXPORT_FILENAME};
use crate::state::AppState;

#[derive(Serialize)]
pub struct SessionResponse {
    #[serde(flatten)]
    pub session: SessionState,
    pub extracting: bool,
}

fn current_record(state: &AppState) -> Result<Arc<CvRecord>, AppError> {
    Ok(state.store.snapshot().record.ok_or(StoreError::NoRecord)?)
}

/// POST /api/extract-cv
///
/// The staged file is removed before the outcome is inspected, so it never
/// outlives the request. A failed extraction leaves the session untouched.
pub async fn handle_extract_cv(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<CvRecord>, AppError> {
    let _guard = state
        .store
        .begin_extraction()
        .ok_or_else(|| AppError::Conflict("an extraction is already in progress".to_string()))?;

    let staged = stage_upload(
        &mut multipart,
        &state.config.upload_dir,
        state.config.max_upload_bytes,
    )
    .await?;

    let outcome = state.gateway.extract(staged.path()).await;
    discard(staged);
    let text = outcome?;

    let record = normalize_response(&text);
    let session = state.store.dispatch(Action::Load {
        record: record.clone(),
    })?;
    info!(
        "Loaded extracted CV: {} skills, {} experiences, {} degrees (revision {})",
        record.skills.len(),
        record.experiences.len(),
        record.degrees.len(),
        session.revision
    );
    Ok(Json(record))
}

/// GET /api/cv
pub async fn handle_get_cv(State(state): State<AppState>) -> Json<SessionResponse> {
    Json(SessionResponse {
        session: state.store.snapshot(),
        extracting: state.store.is_extracting(),
    })
}

/// GET /api/cv/events
/// Server-sent `session` events: the current snapshot first, then every
/// snapshot the store publishes.
pub async fn handle_events(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    let snapshots = WatchStream::new(state.store.subscribe())
        .map(|session| Event::default().event("session").json_data(session));
    Sse::new(snapshots).keep_alive(KeepAlive::default())
}

/// POST /api/cv/actions
/// A posted `load` goes through the normalizer like `PUT /api/cv`.
pub async fn handle_dispatch(
    State(state): State<AppState>,
    Json(action): Json<Action>,
) -> Result<Json<SessionState>, AppError> {
    let action = match action {
        Action::Load { record } => Action::Load {
            record: normalize_record(&record),
        },
        other => other,
    };
    Ok(Json(state.store.dispatch(action)?))
}

/// PUT /api/cv
/// Saves a whole record from the editor. The payload goes through the
/// normalizer, so partial or loosely typed JSON is accepted.
pub async fn handle_put_cv(
    State(state): State<AppState>,
    Json(raw): Json<Value>,
) -> Result<Json<SessionState>, AppError> {
    let record = normalize(&raw);
    Ok(Json(state.store.dispatch(Action::Load { record })?))
}

/// GET /api/cv/document
pub async fn handle_get_document(
    State(state): State<AppState>,
) -> Result<Json<Document>, AppError> {
    let record = current_record(&state)?;
    Ok(Json(render(&record)))
}

/// GET /api/cv/preview
pub async fn handle_preview(State(state): State<AppState>) -> Result<Response, AppError> {
    let record = current_record(&state)?;
    let html = state.preview.write(&render(&record))?;
    Ok(([(header::CONTENT_TYPE, state.preview.content_type())], html).into_response())
}

/// GET /api/cv/export
pub async fn handle_export(State(state): State<AppState>) -> Result<Response, AppError> {
    let record = current_record(&state)?;
    pdf_attachment(state.export.clone(), render(&record)).await
}

/// POST /api/generate-cv
/// Stateless: renders the posted record without touching the session.
pub async fn handle_generate_cv(
    State(state): State<AppState>,
    Json(raw): Json<Value>,
) -> Result<Response, AppError> {
    let record = normalize(&raw);
    pdf_attachment(state.export.clone(), render(&record)).await
}

/// Writes the PDF on the blocking pool and wraps it as a download.
async fn pdf_attachment(export: Arc<PdfExport>, document: Document) -> Result<Response, AppError> {
    let content_type = export.content_type();
    let bytes = tokio::task::spawn_blocking(move || export.write(&document))
        .await
        .map_err(|e| {
            AppError::Internal(anyhow::anyhow!("spawn_blocking failed in PDF export: {e}"))
        })??;

    Ok((
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{EXPORT_FILENAME}\""),
            ),
        ],
        bytes,
    )
        .into_response())
}
