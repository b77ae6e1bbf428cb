//! SSE (Server-Sent Events) stream parser
//!
//! Parses the chunked body of a streaming chat completion. The body is a
//! sequence of lines:
//! - `data: <json>` - a completion chunk carrying `choices[0].delta.content`
//! - `data: [DONE]` - the end-of-stream sentinel
//! - anything else (blank lines, `: comments`, `event:` fields) - ignored
//!
//! # Module structure
//! - `events` - Event type definitions (StreamEvent, SseLine, SseParseError)
//! - `payloads` - Internal payload deserialization structs
//! - `parser` - Parsing logic (SseParser, LineBuffer, parse_sse_line, parse_data_payload)

mod events;
mod parser;
mod payloads;

// Re-export public types
pub use events::{SseLine, SseParseError, StreamEvent, DONE_SENTINEL};
pub use parser::{parse_data_payload, parse_sse_line, LineBuffer, SseParser};
