// src/utils/credential.rs

use std::fmt;

use reqwest::header::HeaderValue;

use crate::error::AppError;

/// API key for the generative question service.
///
/// Lives only inside a quiz session and is only ever written into the
/// `Authorization` header of requests to the configured endpoint.
#[derive(Clone)]
pub struct ApiCredential(String);

impl ApiCredential {
    /// Validates the key locally, before any network call is made.
    pub fn parse(raw: &str) -> Result<Self, AppError> {
        let key = raw.trim();

        if key.is_empty() {
            return Err(AppError::InvalidCredential("the key is empty".to_string()));
        }
        if key.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(AppError::InvalidCredential(
                "the key must not contain whitespace".to_string(),
            ));
        }
        if !key.is_ascii() {
            return Err(AppError::InvalidCredential(
                "the key must only contain ASCII characters".to_string(),
            ));
        }
        // Same check reqwest applies when building the bearer header.
        if HeaderValue::from_str(&format!("Bearer {}", key)).is_err() {
            return Err(AppError::InvalidCredential(
                "the key cannot be sent as a header".to_string(),
            ));
        }

        Ok(Self(key.to_string()))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiCredential(<redacted>)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_trims_key() {
        let cred = ApiCredential::parse("  sk-test-123  ").unwrap();
        assert_eq!(cred.expose(), "sk-test-123");
    }

    #[test]
    fn test_parse_rejects_empty() {
        for raw in ["", "   ", "\n"] {
            assert!(matches!(
                ApiCredential::parse(raw),
                Err(AppError::InvalidCredential(_))
            ));
        }
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for raw in ["sk test", "sk-\u{7f}x", "sk-ключ"] {
            assert!(matches!(
                ApiCredential::parse(raw),
                Err(AppError::InvalidCredential(_))
            ));
        }
    }

    #[test]
    fn test_debug_is_redacted() {
        let cred = ApiCredential::parse("sk-secret").unwrap();
        assert!(!format!("{:?}", cred).contains("sk-secret"));
    }
}
