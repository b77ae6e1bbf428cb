//! Network-related error types.
//!
//! This module defines errors that occur while talking to the completion
//! endpoint, both before the response body starts and while it streams.

use std::fmt;

/// Network-specific error variants.
#[derive(Debug, Clone, PartialEq)]
pub enum NetworkError {
    /// Connection to the server failed.
    ConnectionFailed { url: String, message: String },

    /// Request timed out.
    Timeout { operation: String },

    /// Non-2xx response. `body` carries the raw response text.
    HttpStatus { status: u16, body: String },

    /// The response body could not be decoded.
    InvalidResponse { message: String },

    /// The body stream failed after it had started.
    StreamInterrupted { message: String },

    /// Generic network error.
    Other { message: String },
}

impl NetworkError {
    /// Check if this error can be retried.
    ///
    /// Every transport failure is retried up to the policy bound, including
    /// non-2xx statuses; only configuration and cancellation short-circuit.
    pub fn is_retryable(&self) -> bool {
        true
    }

    /// Status code, when the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            NetworkError::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Get a user-friendly error message.
    pub fn user_message(&self) -> String {
        match self {
            NetworkError::ConnectionFailed { .. } => {
                "Unable to reach the mentor service. Please check your internet connection."
                    .to_string()
            }
            NetworkError::Timeout { operation } => {
                format!("The {} timed out. The service may be slow or unreachable.", operation)
            }
            NetworkError::HttpStatus { status, .. } => match *status {
                400 => "The request was rejected by the service.".to_string(),
                401 | 403 => "The API key was rejected. Please check your configuration.".to_string(),
                429 => "Too many requests. Please wait a moment and try again.".to_string(),
                500..=599 => "The service is experiencing issues. Please try again later.".to_string(),
                _ => format!("The service returned an error (HTTP {}).", status),
            },
            NetworkError::InvalidResponse { .. } => {
                "Received an invalid response from the service. Please try again.".to_string()
            }
            NetworkError::StreamInterrupted { .. } => {
                "The reply was interrupted before it finished.".to_string()
            }
            NetworkError::Other { message } => format!("Network error: {}", message),
        }
    }

    /// Get a short error code for logging.
    pub fn error_code(&self) -> &'static str {
        match self {
            NetworkError::ConnectionFailed { .. } => "E_NET_CONN",
            NetworkError::Timeout { .. } => "E_NET_TIMEOUT",
            NetworkError::HttpStatus { .. } => "E_NET_HTTP",
            NetworkError::InvalidResponse { .. } => "E_NET_INVALID",
            NetworkError::StreamInterrupted { .. } => "E_NET_STREAM",
            NetworkError::Other { .. } => "E_NET_OTHER",
        }
    }
}

impl fmt::Display for NetworkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetworkError::ConnectionFailed { url, message } => {
                write!(f, "Connection failed to '{}': {}", url, message)
            }
            NetworkError::Timeout { operation } => write!(f, "{} timed out", operation),
            NetworkError::HttpStatus { status, body } => {
                write!(f, "HTTP {} error: {}", status, body)
            }
            NetworkError::InvalidResponse { message } => {
                write!(f, "Invalid response: {}", message)
            }
            NetworkError::StreamInterrupted { message } => {
                write!(f, "Stream interrupted: {}", message)
            }
            NetworkError::Other { message } => write!(f, "Network error: {}", message),
        }
    }
}

impl std::error::Error for NetworkError {}

/// Classify a reqwest error into a NetworkError.
pub fn classify_reqwest_error(err: &reqwest::Error, url: &str) -> NetworkError {
    if err.is_connect() {
        NetworkError::ConnectionFailed {
            url: url.to_string(),
            message: err.to_string(),
        }
    } else if err.is_timeout() {
        NetworkError::Timeout {
            operation: "HTTP request".to_string(),
        }
    } else if err.is_status() {
        NetworkError::HttpStatus {
            status: err.status().map(|s| s.as_u16()).unwrap_or(0),
            body: err.to_string(),
        }
    } else if err.is_decode() {
        NetworkError::InvalidResponse {
            message: format!("Failed to decode response: {}", err),
        }
    } else {
        NetworkError::Other {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_transport_failure_is_retryable() {
        let errors = vec![
            NetworkError::ConnectionFailed {
                url: "https://api.deepseek.com".to_string(),
                message: "refused".to_string(),
            },
            NetworkError::Timeout {
                operation: "connect".to_string(),
            },
            NetworkError::HttpStatus {
                status: 401,
                body: "bad key".to_string(),
            },
            NetworkError::HttpStatus {
                status: 503,
                body: String::new(),
            },
            NetworkError::StreamInterrupted {
                message: "reset".to_string(),
            },
        ];
        for err in errors {
            assert!(err.is_retryable(), "{:?} should be retryable", err);
        }
    }

    #[test]
    fn test_status_accessor() {
        let err = NetworkError::HttpStatus {
            status: 502,
            body: "bad gateway".to_string(),
        };
        assert_eq!(err.status(), Some(502));
        assert_eq!(
            NetworkError::Other {
                message: "x".to_string()
            }
            .status(),
            None
        );
    }

    #[test]
    fn test_user_message_http_status() {
        let err_401 = NetworkError::HttpStatus {
            status: 401,
            body: "Unauthorized".to_string(),
        };
        assert!(err_401.user_message().contains("API key"));

        let err_500 = NetworkError::HttpStatus {
            status: 500,
            body: "Internal Server Error".to_string(),
        };
        assert!(err_500.user_message().contains("service"));
    }

    #[test]
    fn test_display_carries_status_and_body() {
        let err = NetworkError::HttpStatus {
            status: 429,
            body: "{\"error\":\"rate limited\"}".to_string(),
        };
        let display = err.to_string();
        assert!(display.contains("429"));
        assert!(display.contains("rate limited"));
        assert_eq!(err.error_code(), "E_NET_HTTP");
    }
}
