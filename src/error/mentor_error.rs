//! Unified error type for the mentor chat engine.
//!
//! `MentorError` consolidates the domain errors into one enum so that the
//! retry policy, the session controller and the CLI can classify a failure
//! without matching on transport details.

use std::fmt;

use super::category::ErrorCategory;
use super::config::ConfigError;
use super::network::NetworkError;

/// Why a send was refused before anything was appended to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendRejection {
    /// The text was empty or whitespace only.
    EmptyText,
    /// Another reply is still streaming for this session.
    AlreadySending,
    /// There is no previous prompt to resend.
    NothingToRetry,
    /// The bubble cannot be regenerated (unknown id, not an assistant reply,
    /// or not preceded by a user message).
    NotRegenerable,
}

impl fmt::Display for SendRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SendRejection::EmptyText => write!(f, "message is empty"),
            SendRejection::AlreadySending => write!(f, "a reply is already in progress"),
            SendRejection::NothingToRetry => write!(f, "no previous message to retry"),
            SendRejection::NotRegenerable => write!(f, "message cannot be regenerated"),
        }
    }
}

/// Unified error type for the mentor chat engine.
#[derive(Debug, Clone, PartialEq)]
pub enum MentorError {
    /// Credential or endpoint configuration is missing. Never retried.
    Configuration(ConfigError),

    /// Transport failure: non-2xx status, connection problems, or a body
    /// stream that broke off.
    Network(NetworkError),

    /// The caller cancelled the operation.
    Cancelled,

    /// The send was refused by the session's validation rules.
    Rejected(SendRejection),

    /// Invalid request built by the caller.
    Client { message: String },
}

impl MentorError {
    /// Get the category of this error.
    pub fn category(&self) -> ErrorCategory {
        match self {
            MentorError::Configuration(_) => ErrorCategory::Configuration,
            MentorError::Network(NetworkError::HttpStatus { .. }) => ErrorCategory::Server,
            MentorError::Network(_) => ErrorCategory::Network,
            MentorError::Cancelled => ErrorCategory::Cancelled,
            MentorError::Rejected(_) => ErrorCategory::User,
            MentorError::Client { .. } => ErrorCategory::Client,
        }
    }

    /// Check if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            MentorError::Network(err) => err.is_retryable(),
            _ => false,
        }
    }

    /// True for cancellation, which callers treat as a clean stop.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, MentorError::Cancelled)
    }

    /// Get a user-friendly error message.
    pub fn user_message(&self) -> String {
        match self {
            MentorError::Configuration(err) => err.to_string(),
            MentorError::Network(err) => err.user_message(),
            MentorError::Cancelled => "Generation stopped.".to_string(),
            MentorError::Rejected(reason) => format!("Cannot send: {}.", reason),
            MentorError::Client { message } => format!("Invalid request: {}", message),
        }
    }

    /// Get a short error code for logging.
    pub fn error_code(&self) -> &'static str {
        match self {
            MentorError::Configuration(err) => err.error_code(),
            MentorError::Network(err) => err.error_code(),
            MentorError::Cancelled => "E_CANCELLED",
            MentorError::Rejected(_) => "E_REJECTED",
            MentorError::Client { .. } => "E_CLIENT",
        }
    }

    /// Get the recovery hint for this error.
    pub fn recovery_hint(&self) -> &'static str {
        self.category().recovery_hint()
    }
}

impl fmt::Display for MentorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MentorError::Configuration(err) => write!(f, "{}", err),
            MentorError::Network(err) => write!(f, "{}", err),
            MentorError::Cancelled => write!(f, "Operation cancelled"),
            MentorError::Rejected(reason) => write!(f, "Send rejected: {}", reason),
            MentorError::Client { message } => write!(f, "Client error: {}", message),
        }
    }
}

impl std::error::Error for MentorError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MentorError::Configuration(err) => Some(err),
            MentorError::Network(err) => Some(err),
            _ => None,
        }
    }
}

impl From<NetworkError> for MentorError {
    fn from(err: NetworkError) -> Self {
        MentorError::Network(err)
    }
}

impl From<ConfigError> for MentorError {
    fn from(err: ConfigError) -> Self {
        MentorError::Configuration(err)
    }
}

impl From<SendRejection> for MentorError {
    fn from(reason: SendRejection) -> Self {
        MentorError::Rejected(reason)
    }
}

impl From<serde_json::Error> for MentorError {
    fn from(err: serde_json::Error) -> Self {
        MentorError::Network(NetworkError::InvalidResponse {
            message: err.to_string(),
        })
    }
}

impl From<reqwest::Error> for MentorError {
    fn from(err: reqwest::Error) -> Self {
        let url = err
            .url()
            .map(|u| u.to_string())
            .unwrap_or_else(|| "unknown".to_string());
        MentorError::Network(super::network::classify_reqwest_error(&err, &url))
    }
}
