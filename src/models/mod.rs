mod bubble;
mod message;
mod request;
mod response;

pub use bubble::{BubbleRole, ChatBubble};
pub use message::{ChatMessage, MessageRole};
pub use request::{ChatCompletionRequest, ChatOptions, DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE};
pub use response::{ChatResult, CompletionChoice, CompletionMessage, CompletionResponse};
