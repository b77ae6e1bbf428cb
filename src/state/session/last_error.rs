//! The most recent send failure, kept for "retry" affordances.

use chrono::{DateTime, Utc};

use crate::error::{ErrorCategory, MentorError};

/// A failed send, as remembered by the session.
#[derive(Debug, Clone, PartialEq)]
pub struct LastError {
    pub error: MentorError,
    pub occurred_at: DateTime<Utc>,
}

impl LastError {
    pub fn new(error: MentorError) -> Self {
        Self {
            error,
            occurred_at: Utc::now(),
        }
    }

    /// Text suitable for showing to the user.
    pub fn message(&self) -> String {
        self.error.user_message()
    }

    pub fn kind(&self) -> ErrorCategory {
        self.error.category()
    }

    pub fn code(&self) -> &'static str {
        self.error.error_code()
    }
}
