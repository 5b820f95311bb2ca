// src/handlers/mod.rs

pub mod document;
pub mod quiz;
pub mod result;
pub mod session;
