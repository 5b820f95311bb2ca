// src/services/mod.rs

pub mod ingestor;
pub mod question_generator;
pub mod quiz_runtime;
pub mod report;
pub mod scorer;
pub mod session;
