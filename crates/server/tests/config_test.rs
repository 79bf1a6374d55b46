//! # Configuration Tests
//!
//! This file contains tests for the configuration loading logic: layered
//! defaults, YAML files with `${VAR}` substitution, and environment
//! variable overrides.

use shoptalk_server::config::{get_config, ConfigError};
use std::env;
use std::io::Write;
use std::sync::Mutex;

// A mutex to ensure that tests modifying the environment run sequentially.
// This is crucial because environment variables are a shared, global resource,
// and running tests in parallel (`cargo test` default) could cause them to interfere.
static ENV_LOCK: Mutex<()> = Mutex::new(());

/// A helper function to clear all environment variables used by `get_config`.
/// This ensures a clean slate before each test runs.
fn clear_env_vars() {
    env::remove_var("PORT");
    env::remove_var("DB_URL");
    env::remove_var("DATA_DIR");
    env::remove_var("AI_API_KEY");
    env::remove_var("SHOPTALK_AI__PROVIDER");
    env::remove_var("SHOPTALK_AI__API_URL");
    env::remove_var("SHOPTALK_AI__API_KEY");
    env::remove_var("SHOPTALK_AI__MODEL_NAME");
    env::remove_var("SHOPTALK_AI__REQUEST_TIMEOUT_SECS");
}

/// Writes a config file into a temp dir and returns the dir and file path.
fn write_config(content: &str) -> (tempfile::TempDir, String) {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("config.yml");
    let mut file = std::fs::File::create(&path).expect("Failed to create config file");
    file.write_all(content.as_bytes())
        .expect("Failed to write config file");
    let path = path.to_str().expect("path is valid UTF-8").to_string();
    (dir, path)
}

#[test]
fn test_defaults_without_file_or_env() {
    let _lock = ENV_LOCK.lock().unwrap();
    clear_env_vars();

    // No override path: the crate-local config.yml does not exist in the
    // repository, so only defaults and the (cleared) environment apply.
    let config = get_config(None).expect("Defaults alone should be a valid config");

    assert_eq!(config.port, 9090);
    assert_eq!(config.db_url, "db/shoptalk.db");
    assert_eq!(config.data_dir, None);
    assert_eq!(config.ai.provider, "gemini");
    assert_eq!(config.ai.model_name, "gemini-1.5-flash");
    assert_eq!(config.ai.request_timeout_secs, 30);
    assert_eq!(config.ai.api_key, None);
}

#[test]
fn test_file_values_are_loaded() {
    let _lock = ENV_LOCK.lock().unwrap();
    clear_env_vars();

    let (_dir, path) = write_config(
        r#"
port: 8081
db_url: "custom/sales.db"
data_dir: "exports"
ai:
  provider: "local"
  api_url: "http://localhost:1234/v1/chat/completions"
  model_name: "test-model"
  request_timeout_secs: 5
"#,
    );

    let config = get_config(Some(&path)).expect("Failed to load config file");

    assert_eq!(config.port, 8081);
    assert_eq!(config.db_url, "custom/sales.db");
    assert_eq!(config.data_dir, Some("exports".to_string()));
    assert_eq!(config.ai.provider, "local");
    assert_eq!(
        config.ai.api_url,
        Some("http://localhost:1234/v1/chat/completions".to_string())
    );
    assert_eq!(config.ai.model_name, "test-model");
    assert_eq!(config.ai.request_timeout_secs, 5);
}

#[test]
fn test_env_var_substitution_in_file() {
    let _lock = ENV_LOCK.lock().unwrap();
    clear_env_vars();
    env::set_var("AI_API_KEY", "key-from-env");

    let (_dir, path) = write_config(
        r#"
ai:
  provider: "gemini"
  api_key: "${AI_API_KEY}"
"#,
    );

    let config = get_config(Some(&path)).expect("Failed to load config file");
    assert_eq!(config.ai.api_key, Some("key-from-env".to_string()));

    clear_env_vars();
}

#[test]
fn test_env_vars_override_top_level_keys() {
    let _lock = ENV_LOCK.lock().unwrap();
    clear_env_vars();
    env::set_var("PORT", "18080");
    env::set_var("DB_URL", "env/override.db");

    let (_dir, path) = write_config("port: 8081\ndb_url: \"file.db\"\n");

    let config = get_config(Some(&path)).expect("Failed to load config file");
    assert_eq!(config.port, 18080);
    assert_eq!(config.db_url, "env/override.db");

    clear_env_vars();
}

#[test]
fn test_prefixed_env_vars_override_nested_keys() {
    let _lock = ENV_LOCK.lock().unwrap();
    clear_env_vars();
    env::set_var("SHOPTALK_AI__MODEL_NAME", "model-from-env");

    let config = get_config(None).expect("Defaults plus env should be a valid config");
    assert_eq!(config.ai.model_name, "model-from-env");

    clear_env_vars();
}

#[test]
fn test_api_key_falls_back_to_environment() {
    let _lock = ENV_LOCK.lock().unwrap();
    clear_env_vars();
    env::set_var("AI_API_KEY", "fallback-key");

    // No file and no substitution: the key is picked up after all layers.
    let config = get_config(None).expect("Defaults plus env should be a valid config");
    assert_eq!(config.ai.api_key, Some("fallback-key".to_string()));

    clear_env_vars();
}

#[test]
fn test_explicit_missing_config_path_is_an_error() {
    let _lock = ENV_LOCK.lock().unwrap();
    clear_env_vars();

    let result = get_config(Some("/tmp/definitely/not/a/real/config.yml"));
    assert!(matches!(result, Err(ConfigError::NotFound(_))));
}
