//! Configuration errors.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while resolving the chat endpoint configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// No API key in runtime overrides, the config file, or the build.
    #[error("DeepSeek API key is not configured (set DEEPSEEK_API_KEY or add \"api_key\" to the config file)")]
    MissingApiKey,

    /// The base URL is empty or not an http(s) URL.
    #[error("Invalid base URL: {0}")]
    InvalidBaseUrl(String),

    /// The config file exists but could not be read or parsed.
    #[error("Failed to load config file {path}: {message}")]
    FileUnreadable { path: PathBuf, message: String },
}

impl ConfigError {
    /// Get a short error code for logging.
    pub fn error_code(&self) -> &'static str {
        match self {
            ConfigError::MissingApiKey => "E_CFG_KEY",
            ConfigError::InvalidBaseUrl(_) => "E_CFG_URL",
            ConfigError::FileUnreadable { .. } => "E_CFG_FILE",
        }
    }
}
