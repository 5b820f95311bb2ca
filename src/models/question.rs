// src/models/question.rs

use serde::{Deserialize, Serialize};

/// A generated multiple-choice question.
/// Read-only once the quiz has started.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    /// Position in the quiz, starting at 1.
    pub id: u32,

    pub prompt: String,

    /// Answer options in display order. Always at least two.
    pub options: Vec<String>,

    /// Index into `options`.
    pub correct_option_index: usize,
}

/// DTO for sending a question to the participant (excludes the correct answer).
#[derive(Debug, Serialize)]
pub struct PublicQuestion {
    pub id: u32,
    pub prompt: String,
    pub options: Vec<String>,
}

impl From<&Question> for PublicQuestion {
    fn from(q: &Question) -> Self {
        Self {
            id: q.id,
            prompt: q.prompt.clone(),
            options: q.options.clone(),
        }
    }
}

/// Shape the generative API is asked to return for each question.
#[derive(Debug, Clone, Deserialize)]
pub struct GeneratedQuestion {
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: i64,
}

/// Top-level JSON object the generative API is asked to return.
#[derive(Debug, Deserialize)]
pub struct GeneratedQuiz {
    pub questions: Vec<GeneratedQuestion>,
}

impl GeneratedQuestion {
    /// Checks the record against the `Question` invariants and assigns its id.
    pub fn into_question(self, id: u32) -> Result<Question, String> {
        let prompt = self.question.trim().to_string();
        if prompt.is_empty() {
            return Err(format!("question {} has an empty prompt", id));
        }

        let options: Vec<String> = self.options.into_iter().map(|o| o.trim().to_string()).collect();
        if options.len() < 2 {
            return Err(format!("question {} has fewer than two options", id));
        }

        let correct_option_index = usize::try_from(self.correct_answer)
            .ok()
            .filter(|idx| *idx < options.len())
            .ok_or_else(|| {
                format!(
                    "question {} has correct_answer {} outside 0..{}",
                    id,
                    self.correct_answer,
                    options.len()
                )
            })?;

        Ok(Question {
            id,
            prompt,
            options,
            correct_option_index,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generated(correct_answer: i64, options: &[&str]) -> GeneratedQuestion {
        GeneratedQuestion {
            question: " What is Rust? ".to_string(),
            options: options.iter().map(|o| o.to_string()).collect(),
            correct_answer,
        }
    }

    #[test]
    fn test_into_question_trims_and_assigns_id() {
        let q = generated(1, &["A fungus", "A language"]).into_question(3).unwrap();
        assert_eq!(q.id, 3);
        assert_eq!(q.prompt, "What is Rust?");
        assert_eq!(q.correct_option_index, 1);
    }

    #[test]
    fn test_into_question_rejects_bad_index() {
        assert!(generated(2, &["A", "B"]).into_question(1).is_err());
        assert!(generated(-1, &["A", "B"]).into_question(1).is_err());
    }

    #[test]
    fn test_into_question_rejects_single_option() {
        assert!(generated(0, &["Only"]).into_question(1).is_err());
    }

    #[test]
    fn test_public_question_hides_answer() {
        let q = generated(0, &["A", "B"]).into_question(1).unwrap();
        let json = serde_json::to_value(PublicQuestion::from(&q)).unwrap();
        assert!(json.get("correct_option_index").is_none());
        assert_eq!(json["options"].as_array().unwrap().len(), 2);
    }
}
