//! SSE event types and definitions
//!
//! Contains the line classification and the typed events produced from a
//! chat completion stream.

/// Payload that marks normal end of stream.
pub const DONE_SENTINEL: &str = "[DONE]";

/// Events surfaced by the completion stream parser
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// One non-empty piece of assistant text
    Fragment(String),
    /// The `[DONE]` sentinel
    Done,
}

/// Represents a parsed SSE line
#[derive(Debug, Clone, PartialEq)]
pub enum SseLine {
    /// Data payload (e.g., "data: {\"choices\": [...]}")
    Data(String),
    /// Empty line - separates events
    Empty,
    /// Anything else: comments, `event:`/`id:` fields, framing noise
    Other(String),
}

/// Errors that can occur while decoding a single data payload.
///
/// These never abort a stream; the parser logs and skips the line.
#[derive(Debug, Clone, PartialEq)]
pub enum SseParseError {
    /// Payload was not valid JSON or did not match the delta schema
    InvalidJson { payload: String, source: String },
}

impl std::fmt::Display for SseParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SseParseError::InvalidJson { payload, source } => {
                write!(f, "Invalid JSON in data line '{}': {}", payload, source)
            }
        }
    }
}

impl std::error::Error for SseParseError {}
