//! Layered configuration: environment, config file, defaults.

use std::fs;

use mood_mentor::config::{ConfigLayer, LayeredConfig, DEFAULT_BASE_URL, DEFAULT_MODEL};
use mood_mentor::error::ConfigError;
use mood_mentor::traits::ConfigProvider;
use serial_test::serial;
use tempfile::TempDir;

const ENV_VARS: [&str; 3] = ["DEEPSEEK_BASE_URL", "DEEPSEEK_API_KEY", "DEEPSEEK_MODEL"];

fn clear_env() {
    for var in ENV_VARS {
        std::env::remove_var(var);
    }
}

fn write_config(dir: &TempDir, json: &str) -> std::path::PathBuf {
    let path = dir.path().join("config.json");
    fs::write(&path, json).unwrap();
    path
}

fn layered(file: Option<std::path::PathBuf>) -> LayeredConfig {
    LayeredConfig::new(ConfigLayer::from_env(), file, ConfigLayer::default())
}

#[test]
#[serial]
fn test_env_overrides_file() {
    clear_env();
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"{"api_key": "sk-file", "model": "file-model", "base_url": "https://file.test/"}"#,
    );
    std::env::set_var("DEEPSEEK_API_KEY", "sk-env");

    let config = layered(Some(path)).resolve().unwrap();
    clear_env();

    assert_eq!(config.api_key, "sk-env");
    assert_eq!(config.model, "file-model");
    assert_eq!(config.base_url, "https://file.test");
    assert_eq!(config.completions_url(), "https://file.test/chat/completions");
}

#[test]
#[serial]
fn test_defaults_fill_the_rest() {
    clear_env();
    std::env::set_var("DEEPSEEK_API_KEY", "sk-env");

    let config = layered(None).resolve().unwrap();
    clear_env();

    assert_eq!(config.base_url, DEFAULT_BASE_URL);
    assert_eq!(config.model, DEFAULT_MODEL);
}

#[test]
#[serial]
fn test_empty_env_value_falls_through_to_file() {
    clear_env();
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, r#"{"api_key": "sk-file"}"#);
    std::env::set_var("DEEPSEEK_API_KEY", "   ");

    let config = layered(Some(path)).resolve().unwrap();
    clear_env();

    assert_eq!(config.api_key, "sk-file");
}

#[test]
#[serial]
fn test_missing_key_everywhere() {
    clear_env();
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, r#"{"model": "deepseek-chat"}"#);

    let err = layered(Some(path)).resolve().unwrap_err();
    assert!(matches!(err, ConfigError::MissingApiKey));
}

#[test]
#[serial]
fn test_config_file_is_reread_on_each_resolve() {
    clear_env();
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, r#"{"api_key": "sk-one"}"#);
    let provider = layered(Some(path.clone()));

    assert_eq!(provider.resolve().unwrap().api_key, "sk-one");
    fs::write(&path, r#"{"api_key": "sk-two"}"#).unwrap();
    assert_eq!(provider.resolve().unwrap().api_key, "sk-two");
}

#[test]
#[serial]
fn test_broken_config_file() {
    clear_env();
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "{ not json");

    let err = layered(Some(path.clone())).resolve().unwrap_err();
    match err {
        ConfigError::FileUnreadable { path: reported, .. } => assert_eq!(reported, path),
        other => panic!("unexpected error {:?}", other),
    }
}
