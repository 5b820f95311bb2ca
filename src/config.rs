// src/config.rs

use std::{env, net::SocketAddr, str::FromStr};

use dotenvy::dotenv;
use url::Url;

/// Bounds for `QuizConfiguration` fields.
pub const MIN_QUESTIONS: u32 = 1;
pub const MAX_QUESTIONS: u32 = 50;
pub const MIN_MARKS_PER_QUESTION: u32 = 1;
pub const MAX_MARKS_PER_QUESTION: u32 = 10;
pub const MIN_DURATION_MINUTES: u32 = 5;
pub const MAX_DURATION_MINUTES: u32 = 180;
pub const MAX_PARTICIPANT_NAME_LEN: u64 = 100;

/// Value stored in an `AnswerSet` for a question that was never answered.
pub const UNANSWERED: i32 = -1;

/// The only media type the ingestor accepts.
pub const PDF_MEDIA_TYPE: &str = "application/pdf";

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub rust_log: String,
    /// Base of an OpenAI-compatible API, e.g. `https://api.openai.com/v1/`.
    pub openai_base_url: Url,
    pub openai_model: String,
    pub generation_timeout_secs: u64,
    pub max_upload_bytes: usize,
    /// Document text beyond this many characters is not sent to the generator.
    pub max_source_chars: usize,
    /// Wall-clock length of one countdown second.
    pub tick_interval_ms: u64,
    /// Sessions not looked up for this long are discarded.
    pub session_idle_secs: u64,
    pub allowed_origins: Vec<String>,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let bind_addr = parse_var("BIND_ADDR", "0.0.0.0:3000");

        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        let openai_base_url = env::var("OPENAI_BASE_URL")
            .unwrap_or_else(|_| "https://api.openai.com/v1/".to_string());
        let openai_base_url = normalize_base_url(&openai_base_url)
            .expect("OPENAI_BASE_URL must be a valid absolute URL");

        let openai_model = env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string());

        let allowed_origins = env::var("ALLOWED_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173,http://127.0.0.1:5173".to_string())
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        Self {
            bind_addr,
            rust_log,
            openai_base_url,
            openai_model,
            generation_timeout_secs: parse_var("GENERATION_TIMEOUT_SECS", "60"),
            max_upload_bytes: parse_var("MAX_UPLOAD_BYTES", "20971520"),
            max_source_chars: parse_var("MAX_SOURCE_CHARS", "48000"),
            tick_interval_ms: parse_var("TICK_INTERVAL_MS", "1000"),
            session_idle_secs: parse_var("SESSION_IDLE_SECS", "14400"),
            allowed_origins,
        }
    }
}

/// Parses a URL and guarantees a trailing slash so that `Url::join`
/// appends to the path instead of replacing its last segment.
pub fn normalize_base_url(raw: &str) -> Result<Url, url::ParseError> {
    let mut raw = raw.trim().to_string();
    if !raw.ends_with('/') {
        raw.push('/');
    }
    Url::parse(&raw)
}

fn parse_var<T>(key: &str, default: &str) -> T
where
    T: FromStr,
    T::Err: std::fmt::Debug,
{
    env::var(key)
        .unwrap_or_else(|_| default.to_string())
        .parse()
        .unwrap_or_else(|e| panic!("{} is not valid: {:?}", key, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_base_url_appends_slash() {
        let url = normalize_base_url("http://127.0.0.1:9000/v1").unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:9000/v1/");
        assert_eq!(
            url.join("chat/completions").unwrap().as_str(),
            "http://127.0.0.1:9000/v1/chat/completions"
        );
    }

    #[test]
    fn test_normalize_base_url_rejects_relative() {
        assert!(normalize_base_url("/v1").is_err());
    }
}
