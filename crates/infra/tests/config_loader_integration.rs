//! Integration tests for configuration loader
//!
//! Tests the end-to-end behavior of loading configuration from files.

use std::io::Write;

use rednit_domain::RednitError;
use rednit_infra::config;
use tempfile::NamedTempFile;

fn config_file(suffix: &str, content: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(suffix)
        .tempfile()
        .expect("Failed to create temp file");
    file.write_all(content.as_bytes()).expect("Failed to write to temp file");
    file
}

#[test]
fn test_load_config_from_json_file() {
    let file = config_file(
        ".json",
        r#"{
            "auth_token": "json-token",
            "base_url": "https://api.example.test",
            "page_size": 25,
            "dispatch": { "max_throttle_retries": 3 },
            "rate_limit": { "enabled": false },
            "callbacks": { "workers": 8, "shutdown_timeout_secs": 5 }
        }"#,
    );

    let config = config::load_from_file(Some(file.path().to_path_buf()))
        .expect("Failed to load config from JSON file");

    assert_eq!(config.auth_token, "json-token");
    assert_eq!(config.base_url, "https://api.example.test");
    assert_eq!(config.page_size, 25);
    assert_eq!(config.dispatch.max_throttle_retries, 3);
    assert!(!config.rate_limit.enabled);
    assert_eq!(config.callbacks.workers, 8);
    assert_eq!(config.callbacks.shutdown_timeout_secs, 5);
}

#[test]
fn test_load_config_from_toml_file() {
    let file = config_file(
        ".toml",
        r#"
            auth_token = "toml-token"
            network_threads = 3

            [rate_limit]
            window_ms = 2500
            burst_threshold = 2
        "#,
    );

    let config = config::load_from_file(Some(file.path().to_path_buf()))
        .expect("Failed to load config from TOML file");

    assert_eq!(config.auth_token, "toml-token");
    assert_eq!(config.network_threads, 3);
    assert_eq!(config.rate_limit.window_ms, 2500);
    assert_eq!(config.rate_limit.burst_threshold, 2);
    assert!(config.rate_limit.enabled);
}

#[test]
fn test_load_config_with_minimal_fields() {
    let file = config_file(".json", r#"{ "auth_token": "only-token" }"#);

    let config = config::load_from_file(Some(file.path().to_path_buf()))
        .expect("Minimal config should load");

    assert_eq!(config.auth_token, "only-token");
    assert_eq!(config.dispatch.max_throttle_retries, 5);
    assert_eq!(config.callbacks.workers, 4);
    assert_eq!(config.page_size, 60);
}

#[test]
fn test_load_config_without_token_fails_validation() {
    let file = config_file(".json", r#"{ "page_size": 10 }"#);

    let result = config::load_from_file(Some(file.path().to_path_buf()));
    assert!(matches!(result, Err(RednitError::Config(_))));
}

#[test]
fn test_load_config_from_nonexistent_file() {
    let result = config::load_from_file(Some("/nonexistent/rednit.json".into()));
    assert!(matches!(result, Err(RednitError::Config(_))));
}

#[test]
fn test_load_config_with_invalid_format() {
    let file = config_file(".json", "{ this is not json");

    let result = config::load_from_file(Some(file.path().to_path_buf()));
    assert!(matches!(result, Err(RednitError::Config(_))));
}
