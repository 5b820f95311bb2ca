// src/models/session.rs

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::question::PublicQuestion;

/// DTO for submitting the generative API credential.
#[derive(Deserialize)]
pub struct CreateSessionRequest {
    /// A missing key is treated like a blank one.
    #[serde(default)]
    pub api_key: String,
}

/// Hand-written so the key never reaches a log line.
impl std::fmt::Debug for CreateSessionRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CreateSessionRequest")
            .field("api_key", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Serialize)]
pub struct SessionCreated {
    pub session_id: Uuid,
}

/// Where a session currently is in the linear quiz flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    AwaitingDocument,
    Ingesting,
    AwaitingConfiguration,
    Generating,
    InProgress,
    Completed,
}

/// Summary of the ingested document (the text itself stays server-side).
#[derive(Debug, Clone, Serialize)]
pub struct DocumentSummary {
    pub file_name: Option<String>,
    pub page_count: usize,
    pub character_count: usize,
}

#[derive(Debug, Serialize)]
pub struct SessionView {
    pub session_id: Uuid,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub stage: Stage,
    /// Last step failure, kept until the next successful step.
    pub banner: Option<String>,
    /// A suspending operation (extraction or generation) is in flight.
    pub busy: bool,
    pub document: Option<DocumentSummary>,
    pub quiz: Option<QuizView>,
}

/// Participant's view of the running (or finished) quiz.
#[derive(Debug, Serialize)]
pub struct QuizView {
    pub participant_name: String,
    pub current_index: usize,
    pub total_questions: usize,
    pub question: PublicQuestion,
    pub selected_option: Option<usize>,
    pub answered_count: usize,
    pub time_remaining_seconds: u32,
    /// e.g. "4:07"
    pub clock: String,
    pub can_go_back: bool,
    pub is_last: bool,
    pub completed: bool,
}

#[derive(Debug, Deserialize)]
pub struct SelectAnswerRequest {
    pub option_index: usize,
}
