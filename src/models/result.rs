// src/models/result.rs

use serde::{Deserialize, Serialize};

use crate::utils::time::format_duration;

/// Outcome of one completed quiz. Derived once, never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizResult {
    pub participant_name: String,
    pub score: u32,
    pub total_questions: u32,
    pub correct_answers: u32,
    pub incorrect_answers: u32,
    pub time_taken_seconds: u64,
    /// Maximum reachable score, kept for the percentage.
    pub max_score: u32,
}

impl QuizResult {
    /// Score as a percentage of the maximum reachable score.
    /// Returns 0 when nothing could be scored.
    pub fn percentage(&self) -> f64 {
        if self.max_score == 0 {
            return 0.0;
        }
        f64::from(self.score) / f64::from(self.max_score) * 100.0
    }

    /// Labeled lines for the exported summary document.
    pub fn summary_lines(&self) -> Vec<(String, String)> {
        vec![
            ("Participant".to_string(), self.participant_name.clone()),
            ("Score".to_string(), self.score.to_string()),
            ("Percentage".to_string(), format!("{:.1}%", self.percentage())),
            ("Total Questions".to_string(), self.total_questions.to_string()),
            ("Correct Answers".to_string(), self.correct_answers.to_string()),
            ("Incorrect Answers".to_string(), self.incorrect_answers.to_string()),
            (
                "Time Taken".to_string(),
                format!("{} seconds", self.time_taken_seconds),
            ),
        ]
    }
}

/// DTO returned by the result endpoint.
#[derive(Debug, Serialize)]
pub struct QuizResultView {
    #[serde(flatten)]
    pub result: QuizResult,
    pub percentage: f64,
    /// e.g. "2m 5s"
    pub time_taken: String,
}

impl From<&QuizResult> for QuizResultView {
    fn from(result: &QuizResult) -> Self {
        Self {
            result: result.clone(),
            percentage: result.percentage(),
            time_taken: format_duration(result.time_taken_seconds),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(score: u32, max_score: u32) -> QuizResult {
        QuizResult {
            participant_name: "Ada".to_string(),
            score,
            total_questions: 3,
            correct_answers: score,
            incorrect_answers: 3 - score,
            time_taken_seconds: 125,
            max_score,
        }
    }

    #[test]
    fn test_percentage_uses_max_score() {
        assert!((result(2, 3).percentage() - 66.666_666).abs() < 1e-3);
        assert_eq!(result(0, 3).percentage(), 0.0);
    }

    #[test]
    fn test_percentage_zero_denominator() {
        assert_eq!(result(0, 0).percentage(), 0.0);
    }

    #[test]
    fn test_view_formats_time() {
        let view = QuizResultView::from(&result(3, 3));
        assert_eq!(view.time_taken, "2m 5s");
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["participant_name"], "Ada");
        assert_eq!(json["percentage"], 100.0);
    }

    #[test]
    fn test_summary_lines_are_labeled() {
        let lines = result(2, 3).summary_lines();
        assert_eq!(lines[0], ("Participant".to_string(), "Ada".to_string()));
        assert!(lines.contains(&("Time Taken".to_string(), "125 seconds".to_string())));
    }
}
