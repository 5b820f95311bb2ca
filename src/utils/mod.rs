// src/utils/mod.rs

pub mod credential;
pub mod time;
