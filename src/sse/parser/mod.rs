//! SSE stream parsing logic
//!
//! Contains the stateful `SseParser` that turns raw body chunks into
//! completion fragments, as well as the line and payload parsing functions.

mod line_buffer;

pub use line_buffer::LineBuffer;

use tracing::debug;

use crate::sse::events::{SseLine, SseParseError, StreamEvent, DONE_SENTINEL};
use crate::sse::payloads::ChunkPayload;

/// Parse a single SSE line into its component type
pub fn parse_sse_line(line: &str) -> SseLine {
    let line = line.trim();
    if line.is_empty() {
        return SseLine::Empty;
    }

    if let Some(rest) = line.strip_prefix("data:") {
        return SseLine::Data(rest.trim().to_string());
    }

    SseLine::Other(line.to_string())
}

/// Parse the payload of a `data:` line.
///
/// Returns:
/// - `Ok(Some(StreamEvent::Done))` for the `[DONE]` sentinel
/// - `Ok(Some(StreamEvent::Fragment(_)))` for a chunk with non-empty delta text
/// - `Ok(None)` for a well-formed chunk without text
/// - `Err(_)` when the payload does not decode
pub fn parse_data_payload(data: &str) -> Result<Option<StreamEvent>, SseParseError> {
    if data == DONE_SENTINEL {
        return Ok(Some(StreamEvent::Done));
    }

    let payload: ChunkPayload =
        serde_json::from_str(data).map_err(|e| SseParseError::InvalidJson {
            payload: data.to_string(),
            source: e.to_string(),
        })?;

    Ok(payload.into_fragment().map(StreamEvent::Fragment))
}

/// Stateful SSE parser that buffers body chunks and emits stream events
/// in receipt order.
#[derive(Debug, Default)]
pub struct SseParser {
    lines: LineBuffer,
    /// Set once the sentinel has been seen; nothing is emitted afterwards
    done: bool,
    skipped: usize,
}

impl SseParser {
    /// Create a new SSE parser
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one complete line.
    ///
    /// Malformed payloads are skipped, never surfaced.
    pub fn feed_line(&mut self, line: &str) -> Option<StreamEvent> {
        if self.done {
            return None;
        }

        let data = match parse_sse_line(line) {
            SseLine::Data(data) => data,
            SseLine::Empty | SseLine::Other(_) => return None,
        };

        match parse_data_payload(&data) {
            Ok(Some(StreamEvent::Done)) => {
                self.done = true;
                Some(StreamEvent::Done)
            }
            Ok(event) => event,
            Err(e) => {
                self.skipped += 1;
                debug!("Skipping malformed SSE line: {}", e);
                None
            }
        }
    }

    /// Buffer a chunk read from the response body.
    pub fn push_chunk(&mut self, chunk: &[u8]) {
        self.lines.push(chunk);
    }

    /// Signal end of body so a trailing unterminated line is processed.
    pub fn end_of_input(&mut self) {
        self.lines.close();
    }

    /// Drain buffered lines until one produces an event.
    ///
    /// `None` means more input is needed (or the stream is done).
    pub fn next_event(&mut self) -> Option<StreamEvent> {
        while !self.done {
            let line = self.lines.next_line()?;
            if let Some(event) = self.feed_line(&line) {
                return Some(event);
            }
        }
        None
    }

    /// Whether the `[DONE]` sentinel has been seen
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Number of data lines skipped because they failed to decode
    pub fn skipped_lines(&self) -> usize {
        self.skipped
    }

    /// Reset the parser state
    pub fn reset(&mut self) {
        self.lines.clear();
        self.done = false;
        self.skipped = 0;
    }
}
