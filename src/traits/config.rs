//! Configuration provider trait abstraction.
//!
//! The completion client asks its provider for the endpoint settings once
//! per send, so runtime overrides and config file edits take effect without
//! rebuilding the client.

use std::sync::Arc;

use crate::config::ChatConfig;
use crate::error::ConfigError;

/// Trait for resolving the chat endpoint configuration.
///
/// # Example
///
/// ```ignore
/// use mood_mentor::config::{ChatConfig, StaticConfig};
/// use mood_mentor::traits::ConfigProvider;
///
/// let provider = StaticConfig::new(ChatConfig::with_api_key("sk-test"));
/// let config = provider.resolve()?;
/// assert_eq!(config.model, "deepseek-chat");
/// ```
pub trait ConfigProvider: Send + Sync {
    /// Resolve the current configuration.
    ///
    /// Fails with [`ConfigError::MissingApiKey`] when no layer supplies a key.
    fn resolve(&self) -> Result<ChatConfig, ConfigError>;
}

impl<P: ConfigProvider + ?Sized> ConfigProvider for Arc<P> {
    fn resolve(&self) -> Result<ChatConfig, ConfigError> {
        (**self).resolve()
    }
}
