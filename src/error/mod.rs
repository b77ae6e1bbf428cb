//! Unified error handling for the mentor chat engine.
//!
//! - **Error Categories**: classification for retry and messaging decisions
//! - **Domain-specific Errors**: configuration and network errors
//! - **Unified Error Type**: `MentorError` consolidates all error types
//! - **Result Type Alias**: `MentorResult<T>`
//!
//! # Error Categories
//!
//! | Category | Description | Retryable |
//! |----------|-------------|-----------|
//! | Network | Connection, timeout, broken stream | Yes |
//! | Server | Non-2xx from the completion endpoint | Yes |
//! | Configuration | Missing API key, bad base URL | No |
//! | Cancelled | Stopped by the caller | No |
//! | User | Empty input, reply already streaming | No |
//! | Client | Invalid request | No |
//!
//! Malformed individual SSE lines are not errors at all: the stream parser
//! skips them and logs at debug level.

mod category;
mod config;
mod mentor_error;
mod network;
mod result;

pub use category::ErrorCategory;
pub use config::ConfigError;
pub use mentor_error::{MentorError, SendRejection};
pub use network::{classify_reqwest_error, NetworkError};
pub use result::MentorResult;

#[cfg(test)]
mod integration_tests {
    use super::*;

    #[test]
    fn test_error_unification() {
        let net_err: MentorError = NetworkError::ConnectionFailed {
            url: "https://api.deepseek.com".to_string(),
            message: "refused".to_string(),
        }
        .into();
        let cfg_err: MentorError = ConfigError::MissingApiKey.into();
        let rejected: MentorError = SendRejection::EmptyText.into();

        assert_eq!(net_err.category(), ErrorCategory::Network);
        assert_eq!(cfg_err.category(), ErrorCategory::Configuration);
        assert_eq!(rejected.category(), ErrorCategory::User);

        for err in [&net_err, &cfg_err, &rejected, &MentorError::Cancelled] {
            assert!(!err.error_code().is_empty());
            assert!(!err.user_message().is_empty());
        }
    }

    #[test]
    fn test_retry_logic() {
        let retryable: Vec<MentorError> = vec![
            NetworkError::HttpStatus {
                status: 500,
                body: String::new(),
            }
            .into(),
            NetworkError::Timeout {
                operation: "request".to_string(),
            }
            .into(),
        ];
        for err in retryable {
            assert!(err.is_retryable(), "Expected {:?} to be retryable", err);
        }

        let permanent: Vec<MentorError> = vec![
            ConfigError::MissingApiKey.into(),
            MentorError::Cancelled,
            SendRejection::AlreadySending.into(),
            MentorError::Client {
                message: "no messages".to_string(),
            },
        ];
        for err in permanent {
            assert!(!err.is_retryable(), "Expected {:?} to not be retryable", err);
        }
    }
}
