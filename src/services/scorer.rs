// src/services/scorer.rs

use std::time::Duration;

use crate::models::{question::Question, quiz_config::QuizConfiguration, result::QuizResult};

/// Number of positions where the selection matches the correct option.
/// Unanswered entries never match.
pub fn count_correct(answers: &[i32], questions: &[Question]) -> usize {
    answers
        .iter()
        .zip(questions)
        .filter(|(answer, question)| {
            usize::try_from(**answer).is_ok_and(|a| a == question.correct_option_index)
        })
        .count()
}

/// Scores a finished quiz.
///
/// `elapsed` is wall-clock time from quiz start to completion, reported in
/// whole seconds regardless of how the quiz ended.
pub fn score(
    config: &QuizConfiguration,
    questions: &[Question],
    answers: &[i32],
    elapsed: Duration,
) -> QuizResult {
    debug_assert_eq!(answers.len(), questions.len());

    let total_questions = questions.len() as u32;
    let correct_answers = count_correct(answers, questions) as u32;

    QuizResult {
        participant_name: config.participant_name.trim().to_string(),
        score: correct_answers * config.marks_per_question,
        total_questions,
        correct_answers,
        incorrect_answers: total_questions - correct_answers,
        time_taken_seconds: elapsed.as_secs(),
        max_score: total_questions * config.marks_per_question,
    }
}
