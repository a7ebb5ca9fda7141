// src/analyze/mod.rs
pub mod ai_client;
pub mod condenser;
pub mod selector;
