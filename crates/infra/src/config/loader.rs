//! Configuration loader
//!
//! Loads client configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. Loads a `.env` file into the environment, if one exists
//! 2. Attempts to load from environment variables
//! 3. If the token is missing, falls back to loading from file
//! 4. Probes multiple paths for config files
//! 5. Supports JSON and TOML formats
//!
//! ## Environment Variables
//! - `REDNIT_AUTH_TOKEN`: API auth token (required)
//! - `REDNIT_BASE_URL`: API base URL
//! - `REDNIT_MAX_THROTTLE_RETRIES`: Retries allowed after a 429
//! - `REDNIT_CALLBACK_WORKERS`: Callback pool size
//! - `REDNIT_NETWORK_THREADS`: Network runtime worker threads
//! - `REDNIT_PAGE_SIZE`: Items requested per page
//! - `REDNIT_REQUEST_TIMEOUT_SECS`: Per-request timeout in seconds
//! - `REDNIT_RATE_LIMIT_ENABLED`: Whether the burst limiter is on (true/false)
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./rednit.json` or `./rednit.toml` (current working directory)
//! 2. `./config.json` or `./config.toml` (current working directory)
//! 3. The same names in the parent and grandparent directories
//! 4. Relative to executable location

use std::path::{Path, PathBuf};
use std::str::FromStr;

use rednit_domain::{ClientConfig, RednitError, Result};

use crate::errors::InfraError;

const CONFIG_FILE_NAMES: [&str; 4] = ["rednit.json", "rednit.toml", "config.json", "config.toml"];

/// Load configuration with automatic fallback strategy
///
/// First attempts to load from environment variables. If the auth token is
/// not set there, falls back to loading from a config file.
///
/// # Errors
/// Returns `RednitError::Config` if:
/// - Configuration cannot be loaded from either source
/// - File format is invalid
/// - The resulting configuration fails validation
pub fn load() -> Result<ClientConfig> {
    match dotenvy::dotenv() {
        Ok(path) => tracing::debug!(path = %path.display(), "Loaded .env file"),
        Err(e) => tracing::debug!(error = %e, "No .env file loaded"),
    }

    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = ?e, "Failed to load from environment, trying file");
            load_from_file(None)
        }
    }
}

/// Load configuration from environment variables
///
/// `REDNIT_AUTH_TOKEN` is required; every other variable overrides the
/// corresponding default when set.
///
/// # Errors
/// Returns `RednitError::Config` if the token is missing or a variable has
/// an invalid value.
pub fn load_from_env() -> Result<ClientConfig> {
    let mut config = ClientConfig::with_token(env_var("REDNIT_AUTH_TOKEN")?);
    apply_env_overrides(&mut config)?;
    config.validate()?;
    Ok(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
/// Environment overrides are applied on top of the file contents.
///
/// # Errors
/// Returns `RednitError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
/// - The resulting configuration fails validation
pub fn load_from_file(path: Option<PathBuf>) -> Result<ClientConfig> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(RednitError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            RednitError::Config("No config file found in any of the standard locations".to_string())
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents =
        std::fs::read_to_string(&config_path).map_err(|e| RednitError::from(InfraError::from(e)))?;

    let mut config = parse_config(&contents, &config_path)?;
    apply_env_overrides(&mut config)?;
    config.validate()?;
    Ok(config)
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`).
fn parse_config(contents: &str, path: &Path) -> Result<ClientConfig> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| RednitError::Config(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| RednitError::Config(format!("Invalid JSON format: {e}"))),
        _ => Err(RednitError::Config(format!("Unsupported config format: {extension}"))),
    }
}

fn apply_env_overrides(config: &mut ClientConfig) -> Result<()> {
    if let Ok(token) = std::env::var("REDNIT_AUTH_TOKEN") {
        config.auth_token = token;
    }
    if let Ok(base_url) = std::env::var("REDNIT_BASE_URL") {
        config.base_url = base_url;
    }
    if let Some(retries) = env_parse("REDNIT_MAX_THROTTLE_RETRIES")? {
        config.dispatch.max_throttle_retries = retries;
    }
    if let Some(workers) = env_parse("REDNIT_CALLBACK_WORKERS")? {
        config.callbacks.workers = workers;
    }
    if let Some(threads) = env_parse("REDNIT_NETWORK_THREADS")? {
        config.network_threads = threads;
    }
    if let Some(page_size) = env_parse("REDNIT_PAGE_SIZE")? {
        config.page_size = page_size;
    }
    if let Some(timeout) = env_parse("REDNIT_REQUEST_TIMEOUT_SECS")? {
        config.request_timeout_secs = timeout;
    }
    config.rate_limit.enabled = env_bool("REDNIT_RATE_LIMIT_ENABLED", config.rate_limit.enabled);
    Ok(())
}

/// Probe multiple paths for configuration files
///
/// Searches for config files in the following locations (in order):
/// 1. Current working directory (`./rednit.{json,toml}`, `./config.{json,toml}`)
/// 2. Parent directories (up to 2 levels)
/// 3. Relative to executable location
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut candidates = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        candidates.extend(candidates_in(&cwd));
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            candidates.extend(candidates_in(exe_dir));
        }
    }

    candidates.into_iter().find(|path| path.exists())
}

fn candidates_in(dir: &Path) -> Vec<PathBuf> {
    ["", "..", "../.."]
        .iter()
        .flat_map(|up| CONFIG_FILE_NAMES.iter().map(move |name| dir.join(up).join(name)))
        .collect()
}

/// Get required environment variable
///
/// # Errors
/// Returns `RednitError::Config` if the variable is not set.
fn env_var(key: &str) -> Result<String> {
    std::env::var(key)
        .map_err(|_| RednitError::Config(format!("Missing required environment variable: {key}")))
}

/// Parse an optional environment variable
///
/// # Errors
/// Returns `RednitError::Config` if the variable is set but does not parse.
fn env_parse<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| RednitError::Config(format!("Invalid value for {key}: {e}"))),
        Err(_) => Ok(None),
    }
}

/// Parse boolean from environment variable
///
/// Accepts: `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive)
fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::Mutex;

    use once_cell::sync::Lazy;

    use super::*;

    static ENV_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

    const VARS: [&str; 8] = [
        "REDNIT_AUTH_TOKEN",
        "REDNIT_BASE_URL",
        "REDNIT_MAX_THROTTLE_RETRIES",
        "REDNIT_CALLBACK_WORKERS",
        "REDNIT_NETWORK_THREADS",
        "REDNIT_PAGE_SIZE",
        "REDNIT_REQUEST_TIMEOUT_SECS",
        "REDNIT_RATE_LIMIT_ENABLED",
    ];

    fn clear_env() {
        for var in VARS {
            std::env::remove_var(var);
        }
    }

    #[test]
    fn test_env_bool_parsing() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");

        std::env::set_var("TEST_REDNIT_BOOL_YES", "yes");
        std::env::set_var("TEST_REDNIT_BOOL_UPPER", "TRUE");
        std::env::set_var("TEST_REDNIT_BOOL_OFF", "off");

        assert!(env_bool("TEST_REDNIT_BOOL_YES", false));
        assert!(env_bool("TEST_REDNIT_BOOL_UPPER", false));
        assert!(!env_bool("TEST_REDNIT_BOOL_OFF", true));

        std::env::remove_var("TEST_REDNIT_BOOL_MISSING");
        assert!(env_bool("TEST_REDNIT_BOOL_MISSING", true));

        std::env::remove_var("TEST_REDNIT_BOOL_YES");
        std::env::remove_var("TEST_REDNIT_BOOL_UPPER");
        std::env::remove_var("TEST_REDNIT_BOOL_OFF");
    }

    #[test]
    fn test_load_from_env_applies_overrides() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();

        std::env::set_var("REDNIT_AUTH_TOKEN", "token-123");
        std::env::set_var("REDNIT_BASE_URL", "http://localhost:9000");
        std::env::set_var("REDNIT_MAX_THROTTLE_RETRIES", "2");
        std::env::set_var("REDNIT_CALLBACK_WORKERS", "8");
        std::env::set_var("REDNIT_PAGE_SIZE", "25");
        std::env::set_var("REDNIT_RATE_LIMIT_ENABLED", "false");

        let result = load_from_env();
        clear_env();

        let config = result.expect("config from env");
        assert_eq!(config.auth_token, "token-123");
        assert_eq!(config.base_url, "http://localhost:9000");
        assert_eq!(config.dispatch.max_throttle_retries, 2);
        assert_eq!(config.callbacks.workers, 8);
        assert_eq!(config.page_size, 25);
        assert!(!config.rate_limit.enabled);
        assert_eq!(config.network_threads, ClientConfig::default().network_threads);
    }

    #[test]
    fn test_load_from_env_requires_token() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();

        let err = load_from_env().unwrap_err();
        assert!(matches!(err, RednitError::Config(msg) if msg.contains("REDNIT_AUTH_TOKEN")));
    }

    #[test]
    fn test_load_from_env_rejects_invalid_numbers() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();

        std::env::set_var("REDNIT_AUTH_TOKEN", "token");
        std::env::set_var("REDNIT_PAGE_SIZE", "many");
        let result = load_from_env();
        clear_env();

        assert!(matches!(result, Err(RednitError::Config(msg)) if msg.contains("REDNIT_PAGE_SIZE")));
    }

    #[test]
    fn test_load_from_json_file() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();

        let mut file = tempfile::Builder::new().suffix(".json").tempfile().expect("temp file");
        write!(
            file,
            r#"{{"auth_token": "file-token", "page_size": 30, "dispatch": {{"max_throttle_retries": 1}}}}"#
        )
        .expect("write config");

        let config = load_from_file(Some(file.path().to_path_buf())).expect("config from json");
        assert_eq!(config.auth_token, "file-token");
        assert_eq!(config.page_size, 30);
        assert_eq!(config.dispatch.max_throttle_retries, 1);
        assert_eq!(config.callbacks.workers, ClientConfig::default().callbacks.workers);
    }

    #[test]
    fn test_load_from_toml_file() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();

        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().expect("temp file");
        writeln!(
            file,
            "auth_token = \"toml-token\"\nbase_url = \"http://127.0.0.1:1\"\n\n[rate_limit]\nenabled = false\nwindow_ms = 100"
        )
        .expect("write config");

        let config = load_from_file(Some(file.path().to_path_buf())).expect("config from toml");
        assert_eq!(config.auth_token, "toml-token");
        assert!(!config.rate_limit.enabled);
        assert_eq!(config.rate_limit.window_ms, 100);
    }

    #[test]
    fn test_env_overrides_file_values() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();

        let mut file = tempfile::Builder::new().suffix(".json").tempfile().expect("temp file");
        write!(file, r#"{{"auth_token": "file-token"}}"#).expect("write config");
        std::env::set_var("REDNIT_AUTH_TOKEN", "env-token");

        let result = load_from_file(Some(file.path().to_path_buf()));
        clear_env();

        assert_eq!(result.expect("config").auth_token, "env-token");
    }

    #[test]
    fn test_invalid_file_contents() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();

        let mut file = tempfile::Builder::new().suffix(".json").tempfile().expect("temp file");
        write!(file, "not json").expect("write config");

        let err = load_from_file(Some(file.path().to_path_buf())).unwrap_err();
        assert!(matches!(err, RednitError::Config(msg) if msg.contains("Invalid JSON")));
    }

    #[test]
    fn test_unsupported_extension() {
        let file = tempfile::Builder::new().suffix(".yaml").tempfile().expect("temp file");
        let err = load_from_file(Some(file.path().to_path_buf())).unwrap_err();
        assert!(matches!(err, RednitError::Config(msg) if msg.contains("Unsupported")));
    }

    #[test]
    fn test_missing_file() {
        let err = load_from_file(Some(PathBuf::from("/nonexistent/rednit.json"))).unwrap_err();
        assert!(matches!(err, RednitError::Config(msg) if msg.contains("not found")));
    }

    #[test]
    fn test_candidates_cover_parent_directories() {
        let candidates = candidates_in(Path::new("/srv/app"));
        assert_eq!(candidates.len(), 12);
        assert_eq!(candidates[0], PathBuf::from("/srv/app/rednit.json"));
        assert!(candidates.contains(&PathBuf::from("/srv/app/../../config.toml")));
    }
}
