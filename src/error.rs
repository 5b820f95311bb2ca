// src/error.rs

use axum::{
    Json,
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

/// Global Application Error Enum.
/// Centralizes error handling and mapping to HTTP responses.
///
/// The first five variants are the quiz-flow step failures. They are shown to
/// the participant verbatim and recorded as the session banner; the payload
/// carries a diagnostic detail that only goes to the log.
#[derive(Debug)]
pub enum AppError {
    // 400 Bad Request: empty or malformed API key, checked before any network call
    InvalidCredential(String),

    // 415 Unsupported Media Type: carries the declared media type
    UnsupportedFileType(String),

    // 422 Unprocessable Entity: the document parsed but every page was empty
    NoExtractableText,

    // 422 Unprocessable Entity: carries the extractor's error
    ExtractionFailed(String),

    // 502 Bad Gateway: carries the transport or parse error
    QuestionGenerationFailed(String),

    // 500 Internal Server Error
    InternalServerError(String),

    // 400 Bad Request
    BadRequest(String),

    // 413 Payload Too Large: upload exceeded MAX_UPLOAD_BYTES
    PayloadTooLarge(String),

    // 404 Not Found
    NotFound(String),

    // 409 Conflict (step out of order, stale response, generation in flight)
    Conflict(String),
}

impl AppError {
    /// Message safe to show to the participant.
    pub fn user_message(&self) -> String {
        match self {
            AppError::InvalidCredential(reason) => format!("Please enter a valid API key: {}", reason),
            AppError::UnsupportedFileType(_) => "Please upload a PDF file".to_string(),
            AppError::NoExtractableText => "No text content found in the PDF".to_string(),
            AppError::ExtractionFailed(_) => {
                "Error reading PDF. Please ensure the file is not corrupted and try again.".to_string()
            }
            AppError::QuestionGenerationFailed(_) => {
                "Failed to generate quiz questions. Please try again.".to_string()
            }
            AppError::InternalServerError(_) => "Internal Server Error".to_string(),
            AppError::PayloadTooLarge(_) => "The uploaded file is too large".to_string(),
            AppError::BadRequest(msg) | AppError::NotFound(msg) | AppError::Conflict(msg) => {
                msg.clone()
            }
        }
    }

    /// Whether this error is a failed quiz-flow step that belongs in the banner.
    pub fn is_step_failure(&self) -> bool {
        matches!(
            self,
            AppError::InvalidCredential(_)
                | AppError::UnsupportedFileType(_)
                | AppError::NoExtractableText
                | AppError::ExtractionFailed(_)
                | AppError::QuestionGenerationFailed(_)
        )
    }

    fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidCredential(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::UnsupportedFileType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            AppError::NoExtractableText | AppError::ExtractionFailed(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            AppError::QuestionGenerationFailed(_) => StatusCode::BAD_GATEWAY,
            AppError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.user_message())
    }
}

impl std::error::Error for AppError {}

/// Implements `IntoResponse` for `AppError`.
/// Converts the error into a JSON response with appropriate HTTP status code.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
            }
            AppError::ExtractionFailed(detail) => {
                tracing::warn!("Text extraction failed: {}", detail);
            }
            AppError::QuestionGenerationFailed(detail) => {
                tracing::warn!("Question generation failed: {}", detail);
            }
            _ => {}
        }

        let body = Json(json!({
            "error": self.user_message(),
        }));

        (self.status(), body).into_response()
    }
}

/// Keeps the status the multipart layer chose, notably 413 for bodies over
/// the upload limit.
impl From<MultipartError> for AppError {
    fn from(err: MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            AppError::PayloadTooLarge(err.body_text())
        } else {
            AppError::BadRequest(err.body_text())
        }
    }
}

/// Every `reqwest` failure happens while talking to the generative API.
impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::QuestionGenerationFailed(err.to_string())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::BadRequest(errors.to_string())
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        AppError::InternalServerError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_failures_map_to_statuses() {
        let cases = [
            (AppError::InvalidCredential("empty".into()), StatusCode::BAD_REQUEST),
            (
                AppError::UnsupportedFileType("text/plain".into()),
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ),
            (AppError::NoExtractableText, StatusCode::UNPROCESSABLE_ENTITY),
            (
                AppError::ExtractionFailed("bad xref".into()),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                AppError::QuestionGenerationFailed("timeout".into()),
                StatusCode::BAD_GATEWAY,
            ),
        ];

        for (err, status) in cases {
            assert!(err.is_step_failure());
            assert_eq!(err.into_response().status(), status);
        }
    }

    #[test]
    fn test_detail_is_not_shown_to_user() {
        let err = AppError::QuestionGenerationFailed("401 invalid_api_key sk-abc".into());
        assert!(!err.user_message().contains("sk-abc"));
        assert!(!AppError::Conflict("busy".into()).is_step_failure());
    }

    #[test]
    fn test_payload_too_large_is_413() {
        let err = AppError::PayloadTooLarge("length limit exceeded".into());
        assert!(!err.is_step_failure());
        assert_eq!(err.into_response().status(), StatusCode::PAYLOAD_TOO_LARGE);
    }
}
