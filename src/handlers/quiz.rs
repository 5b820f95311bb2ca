// src/handlers/quiz.rs

use std::time::Duration;

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    config::Config,
    error::AppError,
    models::{quiz_config::QuizConfiguration, session::SelectAnswerRequest},
    services::session::{SessionStore, generate_quiz},
};

/// Validates the configuration, generates the questions and starts the clock.
///
/// Blocks until the generative API answers. The session reports itself as
/// busy meanwhile and refuses a second generation.
pub async fn start_quiz(
    State(sessions): State<SessionStore>,
    State(config): State<Config>,
    Path(id): Path<Uuid>,
    Json(payload): Json<QuizConfiguration>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let session = sessions.get(id).await?;

    let tick_period = Duration::from_millis(config.tick_interval_ms.max(1));
    let view = generate_quiz(&session, payload, tick_period).await?;
    Ok(Json(view))
}

/// Current question (without its answer), selection and clock.
pub async fn get_quiz(
    State(sessions): State<SessionStore>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let session = sessions.get(id).await?;
    let view = session.lock().await.quiz_view()?;
    Ok(Json(view))
}

pub async fn select_answer(
    State(sessions): State<SessionStore>,
    Path(id): Path<Uuid>,
    Json(req): Json<SelectAnswerRequest>,
) -> Result<impl IntoResponse, AppError> {
    let session = sessions.get(id).await?;
    let mut guard = session.lock().await;
    guard.select_answer(req.option_index)?;
    Ok(Json(guard.quiz_view()?))
}

/// Moves on, or finishes the quiz when called on the last question.
pub async fn next_question(
    State(sessions): State<SessionStore>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let session = sessions.get(id).await?;
    let mut guard = session.lock().await;
    guard.advance()?;
    Ok(Json(guard.view()))
}

pub async fn previous_question(
    State(sessions): State<SessionStore>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let session = sessions.get(id).await?;
    let mut guard = session.lock().await;
    guard.retreat()?;
    Ok(Json(guard.quiz_view()?))
}
