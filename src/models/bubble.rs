//! The visible unit of a chat session.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::message::{ChatMessage, MessageRole};

/// Who a bubble belongs to. Bubbles never carry the system role.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BubbleRole {
    User,
    Assistant,
}

impl From<BubbleRole> for MessageRole {
    fn from(role: BubbleRole) -> Self {
        match role {
            BubbleRole::User => MessageRole::User,
            BubbleRole::Assistant => MessageRole::Assistant,
        }
    }
}

/// A single entry in the session log.
///
/// While `streaming` is true the content only grows; once the bubble is
/// settled every mutator is a no-op.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatBubble {
    /// Unique, never reused. `u-` user, `a-` assistant, `g-` greeting.
    pub id: String,
    pub role: BubbleRole,
    pub content: String,
    /// True only for the in-flight assistant placeholder
    #[serde(default)]
    pub streaming: bool,
    /// When the placeholder was created
    #[serde(default)]
    pub stream_started_at: Option<DateTime<Utc>>,
}

impl ChatBubble {
    /// A settled user bubble.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            id: format!("u-{}", Uuid::new_v4()),
            role: BubbleRole::User,
            content: content.into(),
            streaming: false,
            stream_started_at: None,
        }
    }

    /// An empty assistant placeholder in the pending state.
    pub fn placeholder() -> Self {
        Self {
            id: format!("a-{}", Uuid::new_v4()),
            role: BubbleRole::Assistant,
            content: String::new(),
            streaming: true,
            stream_started_at: Some(Utc::now()),
        }
    }

    /// A settled assistant bubble that opens a fresh session.
    pub fn greeting(content: impl Into<String>) -> Self {
        Self {
            id: format!("g-{}", Uuid::new_v4()),
            role: BubbleRole::Assistant,
            content: content.into(),
            streaming: false,
            stream_started_at: None,
        }
    }

    pub fn is_greeting(&self) -> bool {
        self.id.starts_with("g-")
    }

    /// Append a fragment. Returns false (and leaves the content alone) if the
    /// bubble has already settled.
    pub fn append_fragment(&mut self, fragment: &str) -> bool {
        if !self.streaming {
            return false;
        }
        self.content.push_str(fragment);
        true
    }

    /// Replace the whole content of a pending bubble. Used for one-shot
    /// replies and for failure notices.
    pub fn replace_content(&mut self, content: impl Into<String>) -> bool {
        if !self.streaming {
            return false;
        }
        self.content = content.into();
        true
    }

    /// Freeze the bubble. Idempotent.
    pub fn settle(&mut self) {
        self.streaming = false;
    }

    /// Milliseconds since the placeholder was created, while it is pending.
    pub fn streaming_elapsed_ms(&self) -> Option<i64> {
        if !self.streaming {
            return None;
        }
        self.stream_started_at
            .map(|started| (Utc::now() - started).num_milliseconds())
    }

    pub fn to_chat_message(&self) -> ChatMessage {
        ChatMessage::new(self.role.into(), self.content.clone())
    }
}
