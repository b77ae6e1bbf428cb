//! Chat endpoint configuration.
//!
//! Each field resolves independently through the layers, highest first:
//! 1. runtime overrides (`DEEPSEEK_BASE_URL`, `DEEPSEEK_API_KEY`, `DEEPSEEK_MODEL`)
//! 2. the config file (`~/.mood-mentor/config.json`)
//! 3. values baked in at build time (`VITE_DEEPSEEK_*`)
//! 4. defaults
//!
//! Empty strings count as unset at every layer.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ConfigError;
use crate::traits::ConfigProvider;

/// Default completion endpoint base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.deepseek.com";

/// Default model name.
pub const DEFAULT_MODEL: &str = "deepseek-chat";

/// Directory under the home directory holding the config file.
const CONFIG_DIR: &str = ".mood-mentor";

/// Config file name.
const CONFIG_FILE: &str = "config.json";

/// Fully resolved endpoint configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: String::new(),
            model: DEFAULT_MODEL.to_string(),
        }
    }
}

impl ChatConfig {
    /// Default endpoint and model with the given key.
    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Self::default()
        }
    }

    /// Override the base URL. Trailing slashes are dropped.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = normalize_base_url(&base_url.into());
        self
    }

    /// Override the model.
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// `{base_url}/chat/completions`
    pub fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    /// Check that the configuration can be used for a request.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_key.trim().is_empty() {
            return Err(ConfigError::MissingApiKey);
        }
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(ConfigError::InvalidBaseUrl(self.base_url.clone()));
        }
        Ok(())
    }
}

fn normalize_base_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

/// A partial configuration supplied by one layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigLayer {
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
}

impl ConfigLayer {
    /// Runtime overrides from the process environment.
    pub fn from_env() -> Self {
        Self {
            base_url: std::env::var("DEEPSEEK_BASE_URL").ok(),
            api_key: std::env::var("DEEPSEEK_API_KEY").ok(),
            model: std::env::var("DEEPSEEK_MODEL").ok(),
        }
    }

    /// Values captured when the crate was compiled.
    pub fn build_time() -> Self {
        Self {
            base_url: option_env!("VITE_DEEPSEEK_BASE_URL").map(str::to_string),
            api_key: option_env!("VITE_DEEPSEEK_API_KEY").map(str::to_string),
            model: option_env!("VITE_DEEPSEEK_MODEL").map(str::to_string),
        }
    }

    /// Load a layer from a JSON file.
    ///
    /// A missing file is not an error and yields `Ok(None)`.
    pub fn from_file(path: &Path) -> Result<Option<Self>, ConfigError> {
        if !path.exists() {
            return Ok(None);
        }

        let unreadable = |message: String| ConfigError::FileUnreadable {
            path: path.to_path_buf(),
            message,
        };

        let text = fs::read_to_string(path).map_err(|e| unreadable(e.to_string()))?;
        let layer = serde_json::from_str(&text).map_err(|e| unreadable(e.to_string()))?;
        Ok(Some(layer))
    }

    /// Fill unset fields of `self` from `lower`.
    pub fn or(self, lower: ConfigLayer) -> ConfigLayer {
        ConfigLayer {
            base_url: non_empty(self.base_url).or_else(|| non_empty(lower.base_url)),
            api_key: non_empty(self.api_key).or_else(|| non_empty(lower.api_key)),
            model: non_empty(self.model).or_else(|| non_empty(lower.model)),
        }
    }

    /// Apply defaults for anything still unset.
    pub fn into_config(self) -> ChatConfig {
        let defaults = ChatConfig::default();
        ChatConfig {
            base_url: normalize_base_url(
                &non_empty(self.base_url).unwrap_or(defaults.base_url),
            ),
            api_key: non_empty(self.api_key).unwrap_or(defaults.api_key),
            model: non_empty(self.model).unwrap_or(defaults.model),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// `~/.mood-mentor/config.json`, if the home directory is known.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(CONFIG_DIR).join(CONFIG_FILE))
}

/// Provider that merges runtime, file, and build-time layers on every resolve.
#[derive(Debug, Clone, Default)]
pub struct LayeredConfig {
    runtime: ConfigLayer,
    file_path: Option<PathBuf>,
    build: ConfigLayer,
}

impl LayeredConfig {
    pub fn new(runtime: ConfigLayer, file_path: Option<PathBuf>, build: ConfigLayer) -> Self {
        Self {
            runtime,
            file_path,
            build,
        }
    }

    /// Environment overrides, the default config file, and build-time values.
    pub fn from_environment() -> Self {
        Self::new(
            ConfigLayer::from_env(),
            default_config_path(),
            ConfigLayer::build_time(),
        )
    }

    /// Replace the runtime layer.
    pub fn with_runtime(mut self, runtime: ConfigLayer) -> Self {
        self.runtime = runtime;
        self
    }

    /// Read the config file from `path` instead of the default location.
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file_path = Some(path.into());
        self
    }

    pub fn file_path(&self) -> Option<&Path> {
        self.file_path.as_deref()
    }
}

impl ConfigProvider for LayeredConfig {
    fn resolve(&self) -> Result<ChatConfig, ConfigError> {
        let file = match &self.file_path {
            Some(path) => ConfigLayer::from_file(path)?.unwrap_or_default(),
            None => ConfigLayer::default(),
        };

        let config = self
            .runtime
            .clone()
            .or(file)
            .or(self.build.clone())
            .into_config();

        debug!(
            "Resolved chat config: base_url={}, model={}, api_key_set={}",
            config.base_url,
            config.model,
            !config.api_key.is_empty()
        );

        config.validate()?;
        Ok(config)
    }
}

/// Provider returning a fixed configuration.
#[derive(Debug, Clone)]
pub struct StaticConfig {
    config: ChatConfig,
}

impl StaticConfig {
    pub fn new(config: ChatConfig) -> Self {
        Self { config }
    }
}

impl ConfigProvider for StaticConfig {
    fn resolve(&self) -> Result<ChatConfig, ConfigError> {
        self.config.validate()?;
        Ok(self.config.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layer(base_url: Option<&str>, api_key: Option<&str>, model: Option<&str>) -> ConfigLayer {
        ConfigLayer {
            base_url: base_url.map(str::to_string),
            api_key: api_key.map(str::to_string),
            model: model.map(str::to_string),
        }
    }

    #[test]
    fn test_defaults() {
        let config = ConfigLayer::default().into_config();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.model, DEFAULT_MODEL);
        assert!(config.api_key.is_empty());
        assert_eq!(
            config.completions_url(),
            "https://api.deepseek.com/chat/completions"
        );
    }

    #[test]
    fn test_higher_layer_wins_per_field() {
        let runtime = layer(None, Some("sk-runtime"), None);
        let file = layer(Some("https://proxy.example.com/"), Some("sk-file"), None);
        let build = layer(None, None, Some("deepseek-reasoner"));

        let config = runtime.or(file).or(build).into_config();
        assert_eq!(config.api_key, "sk-runtime");
        assert_eq!(config.base_url, "https://proxy.example.com");
        assert_eq!(config.model, "deepseek-reasoner");
    }

    #[test]
    fn test_empty_strings_fall_through() {
        let runtime = layer(Some(""), Some("  "), None);
        let lower = layer(None, Some("sk-lower"), None);

        let config = runtime.or(lower).into_config();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.api_key, "sk-lower");
    }

    #[test]
    fn test_validate() {
        assert_eq!(
            ChatConfig::default().validate(),
            Err(ConfigError::MissingApiKey)
        );
        assert!(ChatConfig::with_api_key("sk").validate().is_ok());

        let bad = ChatConfig::with_api_key("sk").base_url("api.deepseek.com");
        assert!(matches!(bad.validate(), Err(ConfigError::InvalidBaseUrl(_))));
    }

    #[test]
    fn test_builder_trims_trailing_slash() {
        let config = ChatConfig::with_api_key("sk").base_url("http://localhost:8080//");
        assert_eq!(
            config.completions_url(),
            "http://localhost:8080/chat/completions"
        );
    }

    #[test]
    fn test_missing_file_is_not_an_error() {
        let path = PathBuf::from("/definitely/not/here/config.json");
        assert_eq!(ConfigLayer::from_file(&path), Ok(None));
    }

    #[test]
    fn test_layered_without_key_fails() {
        let provider = LayeredConfig::new(ConfigLayer::default(), None, ConfigLayer::default());
        assert_eq!(provider.resolve(), Err(ConfigError::MissingApiKey));
    }

    #[test]
    fn test_static_config() {
        let provider = StaticConfig::new(ChatConfig::with_api_key("sk-static"));
        assert_eq!(provider.resolve().unwrap().api_key, "sk-static");

        let empty = StaticConfig::new(ChatConfig::default());
        assert_eq!(empty.resolve(), Err(ConfigError::MissingApiKey));
    }
}
