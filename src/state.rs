use std::sync::Arc;

use axum::extract::FromRef;

use crate::{
    config::Config,
    error::AppError,
    services::{
        ingestor::{LopdfExtractor, TextExtractor},
        question_generator::{GeneratorFactory, OpenAiFactory},
        session::SessionStore,
    },
};

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub sessions: SessionStore,
    pub extractor: Arc<dyn TextExtractor>,
    pub generators: Arc<dyn GeneratorFactory>,
}

impl AppState {
    /// State backed by `lopdf` and the configured OpenAI-compatible endpoint.
    pub fn from_config(config: Config) -> Result<Self, AppError> {
        let generators = OpenAiFactory::from_config(&config)?;
        Ok(Self {
            config,
            sessions: SessionStore::default(),
            extractor: Arc::new(LopdfExtractor),
            generators: Arc::new(generators),
        })
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}

impl FromRef<AppState> for SessionStore {
    fn from_ref(state: &AppState) -> Self {
        state.sessions.clone()
    }
}
