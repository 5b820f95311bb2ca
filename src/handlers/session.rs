// src/handlers/session.rs

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use crate::{
    error::AppError,
    models::session::{CreateSessionRequest, SessionCreated},
    services::session::SessionStore,
    state::AppState,
    utils::credential::ApiCredential,
};

/// Starts a quiz session from the participant's API key.
///
/// The key is validated locally and bound to a generator owned by the
/// session. Returns 201 Created with the session id.
pub async fn create_session(
    State(state): State<AppState>,
    Json(payload): Json<CreateSessionRequest>,
) -> Result<impl IntoResponse, AppError> {
    let credential = ApiCredential::parse(&payload.api_key)?;
    let generator = state.generators.connect(credential);
    let session_id = state.sessions.create(generator).await;

    Ok((StatusCode::CREATED, Json(SessionCreated { session_id })))
}

/// Returns the session's stage, banner and progress.
pub async fn get_session(
    State(sessions): State<SessionStore>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let session = sessions.get(id).await?;
    let view = session.lock().await.view();
    Ok(Json(view))
}

/// Clears the document, quiz and result but keeps the credential.
pub async fn restart_session(
    State(sessions): State<SessionStore>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let session = sessions.get(id).await?;
    let mut guard = session.lock().await;
    guard.reset();
    tracing::info!("Session {} restarted", id);
    Ok(Json(guard.view()))
}

/// Discards the session together with its credential.
pub async fn delete_session(
    State(sessions): State<SessionStore>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    sessions.remove(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
