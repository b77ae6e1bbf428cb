use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use super::message::ChatMessage;

pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_MAX_TOKENS: u32 = 512;

/// Per-call options for the completion client.
#[derive(Debug, Clone)]
pub struct ChatOptions {
    /// Request an SSE body instead of a single JSON envelope
    pub stream: bool,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Prepended to the messages as a system-role message
    pub system_prompt: Option<String>,
    /// Cooperative cancellation shared with the caller
    pub cancel: Option<CancellationToken>,
}

impl Default for ChatOptions {
    fn default() -> Self {
        Self {
            stream: false,
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            system_prompt: None,
            cancel: None,
        }
    }
}

impl ChatOptions {
    /// Streaming options with the default sampling settings.
    pub fn streaming() -> Self {
        Self {
            stream: true,
            ..Self::default()
        }
    }

    pub fn with_stream(mut self, stream: bool) -> Self {
        self.stream = stream;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    pub fn with_cancel(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(CancellationToken::is_cancelled)
    }
}

/// Body of `POST {base_url}/chat/completions`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub stream: bool,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl ChatCompletionRequest {
    /// Build the wire body. A non-empty system prompt goes first.
    pub fn new(model: impl Into<String>, messages: &[ChatMessage], options: &ChatOptions) -> Self {
        let mut all = Vec::with_capacity(messages.len() + 1);
        if let Some(prompt) = options.system_prompt.as_deref().filter(|p| !p.is_empty()) {
            all.push(ChatMessage::system(prompt));
        }
        all.extend(messages.iter().cloned());

        Self {
            model: model.into(),
            messages: all,
            stream: options.stream,
            temperature: options.temperature,
            max_tokens: options.max_tokens,
        }
    }
}
