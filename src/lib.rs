//! Mood Mentor - streaming chat session engine for an AI mood mentor
//!
//! This library exposes modules for use in integration tests and by the
//! `mentor` binary.

pub mod adapters;
pub mod cli;
pub mod completion;
pub mod config;
pub mod error;
pub mod exercise;
pub mod models;
pub mod presets;
pub mod prompt;
pub mod retry;
pub mod sse;
pub mod state;
pub mod traits;
pub mod view_state;
