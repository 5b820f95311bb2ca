// src/services/question_generator.rs

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::{
    config::Config,
    error::AppError,
    models::question::{GeneratedQuiz, Question},
    utils::credential::ApiCredential,
};

const SYSTEM_PROMPT: &str = "You write multiple-choice quiz questions about a document. \
Only ask about facts stated in the document. \
Respond with a single JSON object and nothing else.";

/// Remote question synthesis.
///
/// Implementations make exactly one attempt; retrying is up to the participant.
#[async_trait]
pub trait QuestionGenerator: Send + Sync {
    async fn generate(&self, source_text: &str, desired_count: u32) -> Result<Vec<Question>, AppError>;
}

/// Builds a generator bound to one participant's credential.
pub trait GeneratorFactory: Send + Sync {
    fn connect(&self, credential: ApiCredential) -> Arc<dyn QuestionGenerator>;
}

#[derive(Debug, Clone)]
struct OpenAiSettings {
    completions_url: Url,
    model: String,
    max_source_chars: usize,
}

/// Creates `OpenAiGenerator`s that share one HTTP connection pool.
#[derive(Debug, Clone)]
pub struct OpenAiFactory {
    http: Client,
    settings: Arc<OpenAiSettings>,
}

impl OpenAiFactory {
    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        let completions_url = config
            .openai_base_url
            .join("chat/completions")
            .map_err(|e| AppError::InternalServerError(e.to_string()))?;

        let http = Client::builder()
            .timeout(Duration::from_secs(config.generation_timeout_secs))
            .build()
            .map_err(|e| AppError::InternalServerError(e.to_string()))?;

        Ok(Self {
            http,
            settings: Arc::new(OpenAiSettings {
                completions_url,
                model: config.openai_model.clone(),
                max_source_chars: config.max_source_chars,
            }),
        })
    }
}

impl GeneratorFactory for OpenAiFactory {
    fn connect(&self, credential: ApiCredential) -> Arc<dyn QuestionGenerator> {
        Arc::new(OpenAiGenerator {
            http: self.http.clone(),
            settings: self.settings.clone(),
            credential,
        })
    }
}

/// Client for an OpenAI-compatible chat-completions endpoint.
pub struct OpenAiGenerator {
    http: Client,
    settings: Arc<OpenAiSettings>,
    credential: ApiCredential,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    response_format: ResponseFormat,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[async_trait]
impl QuestionGenerator for OpenAiGenerator {
    async fn generate(&self, source_text: &str, desired_count: u32) -> Result<Vec<Question>, AppError> {
        let source = truncate_chars(source_text, self.settings.max_source_chars);
        if source.len() < source_text.len() {
            tracing::info!(
                "Document text truncated to {} characters for generation",
                self.settings.max_source_chars
            );
        }

        let request = ChatRequest {
            model: &self.settings.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: build_prompt(source, desired_count),
                },
            ],
            response_format: ResponseFormat {
                kind: "json_object",
            },
            temperature: 0.7,
        };

        tracing::info!(
            "Requesting {} questions from {}",
            desired_count,
            self.settings.completions_url
        );

        let response = self
            .http
            .post(self.settings.completions_url.clone())
            .bearer_auth(self.credential.expose())
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::QuestionGenerationFailed(format!(
                "generative API returned {}: {}",
                status,
                truncate_chars(&body, 500)
            )));
        }

        let body: ChatResponse = response.json().await?;
        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                AppError::QuestionGenerationFailed("response has no message content".to_string())
            })?;

        parse_questions(&content, desired_count)
    }
}

/// User message asking for exactly `desired_count` questions about `source`.
pub fn build_prompt(source: &str, desired_count: u32) -> String {
    format!(
        "Generate exactly {count} multiple-choice questions based on the document below.\n\
         Return a JSON object of the form \
         {{\"questions\": [{{\"question\": \"...\", \"options\": [\"...\", \"...\", \"...\", \"...\"], \"correct_answer\": 0}}]}} \
         where \"correct_answer\" is the 0-based index of the correct option. \
         Give every question four options and vary the position of the correct one.\n\n\
         Document:\n{source}",
        count = desired_count,
        source = source
    )
}

/// Parses the model's JSON reply into exactly `desired_count` questions.
///
/// Fewer questions than requested, or any malformed question, fails the
/// whole batch. Extra questions are dropped.
pub fn parse_questions(content: &str, desired_count: u32) -> Result<Vec<Question>, AppError> {
    let json = strip_code_fence(content);
    let quiz: GeneratedQuiz = serde_json::from_str(json).map_err(|e| {
        AppError::QuestionGenerationFailed(format!("response is not a question list: {}", e))
    })?;

    let desired = desired_count as usize;
    if quiz.questions.len() < desired {
        return Err(AppError::QuestionGenerationFailed(format!(
            "expected {} questions, got {}",
            desired,
            quiz.questions.len()
        )));
    }

    quiz.questions
        .into_iter()
        .take(desired)
        .zip(1..)
        .map(|(generated, id)| {
            generated
                .into_question(id)
                .map_err(AppError::QuestionGenerationFailed)
        })
        .collect()
}

/// Models sometimes wrap JSON in a markdown fence despite `json_object` mode.
fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    inner.strip_suffix("```").unwrap_or(inner).trim()
}

/// Longest prefix of `text` with at most `max_chars` characters.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}
