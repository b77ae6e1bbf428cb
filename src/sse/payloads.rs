//! SSE payload deserialization structs
//!
//! Typed schema for `choices[0].delta.content`. Every field is optional:
//! a chunk that carries only a role, a finish reason, or usage data decodes
//! cleanly and simply produces no fragment.

use serde::Deserialize;

/// One streamed completion chunk
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct ChunkPayload {
    #[serde(default)]
    pub choices: Vec<ChunkChoice>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct ChunkChoice {
    #[serde(default)]
    pub delta: Option<DeltaPayload>,
}

/// Nested delta payload (OpenAI style)
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct DeltaPayload {
    #[serde(default)]
    pub content: Option<String>,
}

impl ChunkPayload {
    /// The incremental text of the first choice, if any and non-empty.
    pub fn into_fragment(self) -> Option<String> {
        self.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.delta)
            .and_then(|delta| delta.content)
            .filter(|content| !content.is_empty())
    }
}
