// src/handlers/document.rs

use axum::{
    Json,
    extract::{Multipart, Path, State},
    response::IntoResponse,
};
use uuid::Uuid;

use crate::{
    error::AppError,
    services::session::{Upload, ingest_document},
    state::AppState,
};

/// Accepts a PDF upload (multipart field `file`) and extracts its text.
///
/// The declared content type is checked before the bytes reach the
/// extractor. On failure the previously uploaded document, if any, is kept.
pub async fn upload_document(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let session = state.sessions.get(id).await?;

    let mut upload = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        // Bodies over the upload limit fail here with 413.
        let bytes = field.bytes().await?;
        upload = Some(Upload {
            file_name,
            content_type,
            bytes: bytes.to_vec(),
        });
        break;
    }

    let upload =
        upload.ok_or_else(|| AppError::BadRequest("Missing multipart field 'file'".to_string()))?;

    tracing::info!(
        "Session {}: received {} bytes ({})",
        id,
        upload.bytes.len(),
        upload.content_type.as_deref().unwrap_or("no content type")
    );

    let summary = ingest_document(&session, state.extractor.clone(), upload).await?;
    Ok(Json(summary))
}
