//! Error category classification for unified error handling.
//!
//! Categories drive the retry decision and the hint shown next to a failed
//! reply.

use std::fmt;

/// High-level categorization of errors for handling decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Network-related errors (connection, DNS, timeout, dropped stream).
    /// Generally transient and retryable.
    Network,

    /// The completion endpoint answered with a non-2xx status.
    Server,

    /// Client-side errors (invalid requests, broken invariants).
    Client,

    /// User action required (empty input, a reply still streaming).
    User,

    /// Missing or invalid configuration (API key, base URL).
    /// Not retryable until configuration is corrected.
    Configuration,

    /// The operation was cancelled by the caller.
    Cancelled,
}

impl ErrorCategory {
    /// Returns true if errors in this category are generally transient
    /// and the operation can be retried.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorCategory::Network | ErrorCategory::Server)
    }

    /// Returns a short label for the category suitable for logging.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::Network => "network",
            ErrorCategory::Server => "server",
            ErrorCategory::Client => "client",
            ErrorCategory::User => "user",
            ErrorCategory::Configuration => "configuration",
            ErrorCategory::Cancelled => "cancelled",
        }
    }

    /// Returns suggested recovery actions for this category.
    pub fn recovery_hint(&self) -> &'static str {
        match self {
            ErrorCategory::Network => "Check your internet connection and try again",
            ErrorCategory::Server => {
                "The service may be experiencing issues. Please try again later"
            }
            ErrorCategory::Client => "This may be a bug. Please report this issue if it persists",
            ErrorCategory::User => "Please wait for the current reply or check your input",
            ErrorCategory::Configuration => "Set DEEPSEEK_API_KEY or add it to the config file",
            ErrorCategory::Cancelled => "Send the message again to get a new reply",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
