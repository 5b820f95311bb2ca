// src/handlers/result.rs

use axum::{
    Json,
    extract::{Path, State},
    http::header,
    response::IntoResponse,
};
use uuid::Uuid;

use crate::{
    error::AppError,
    models::result::QuizResultView,
    services::{report::render_summary, session::SessionStore},
};

pub async fn get_result(
    State(sessions): State<SessionStore>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let session = sessions.get(id).await?;
    let guard = session.lock().await;
    Ok(Json(QuizResultView::from(guard.result()?)))
}

/// Downloads the result as `quiz_result.pdf`.
pub async fn download_result_pdf(
    State(sessions): State<SessionStore>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let session = sessions.get(id).await?;
    let lines = session.lock().await.result()?.summary_lines();

    let bytes = tokio::task::spawn_blocking(move || render_summary("Quiz Result", &lines)).await?;

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"quiz_result.pdf\"",
            ),
        ],
        bytes,
    ))
}
