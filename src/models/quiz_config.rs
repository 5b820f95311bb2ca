// src/models/quiz_config.rs

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::config::{
    MAX_DURATION_MINUTES, MAX_MARKS_PER_QUESTION, MAX_PARTICIPANT_NAME_LEN, MAX_QUESTIONS,
    MIN_DURATION_MINUTES, MIN_MARKS_PER_QUESTION, MIN_QUESTIONS,
};

/// Operator-supplied parameters for one quiz.
/// Accepted once per quiz and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct QuizConfiguration {
    #[validate(
        length(min = 1, max = MAX_PARTICIPANT_NAME_LEN),
        custom(function = validate_participant_name)
    )]
    pub participant_name: String,

    #[validate(range(min = MIN_QUESTIONS, max = MAX_QUESTIONS))]
    pub number_of_questions: u32,

    #[validate(range(min = MIN_MARKS_PER_QUESTION, max = MAX_MARKS_PER_QUESTION))]
    pub marks_per_question: u32,

    #[validate(range(min = MIN_DURATION_MINUTES, max = MAX_DURATION_MINUTES))]
    pub duration_in_minutes: u32,
}

impl QuizConfiguration {
    pub fn duration_seconds(&self) -> u32 {
        self.duration_in_minutes * 60
    }
}

fn validate_participant_name(name: &str) -> Result<(), validator::ValidationError> {
    if name.trim().is_empty() {
        return Err(validator::ValidationError::new("participant_name_blank"));
    }
    Ok(())
}
