//! Common test utilities for integration tests.
//!
//! # Example
//!
//! ```ignore
//! let http = MockHttpConfig::new().with_sse([delta("hi"), done()]).build();
//! let controller = test_controller(http.clone());
//! ```

#![allow(dead_code)]

pub mod mocks;

pub use mocks::*;

use mood_mentor::completion::CompletionClient;
use mood_mentor::config::{ChatConfig, StaticConfig};
use mood_mentor::state::{Session, SessionController};
use mood_mentor::traits::HttpClient;

pub const TEST_API_KEY: &str = "sk-test-0123456789";
pub const TEST_BASE_URL: &str = "https://llm.test";

/// A valid configuration pointing at a fake host.
pub fn test_config() -> StaticConfig {
    StaticConfig::new(ChatConfig::with_api_key(TEST_API_KEY).base_url(TEST_BASE_URL))
}

/// Controller over `http` with a fixed, short system prompt.
pub fn test_controller<H: HttpClient>(http: H) -> SessionController<H, StaticConfig> {
    SessionController::new(
        CompletionClient::new(http, test_config()),
        || "You are a gentle mentor.".to_string(),
    )
}

/// One SSE event carrying `text` as a content delta.
pub fn delta(text: &str) -> String {
    format!(
        "data: {}\n\n",
        serde_json::json!({"choices": [{"delta": {"content": text}}]})
    )
}

/// The end-of-stream sentinel event.
pub fn done() -> String {
    "data: [DONE]\n\n".to_string()
}

/// Content of the newest bubble.
pub fn last_content(session: &Session) -> String {
    session
        .last_bubble()
        .map(|bubble| bubble.content)
        .unwrap_or_default()
}
