// src/models/mod.rs

pub mod question;
pub mod quiz_config;
pub mod result;
pub mod session;
