//! Configuration management

use std::ops::RangeInclusive;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_BASE_URL, DEFAULT_BURST_BACKOFF_MAX_MS, DEFAULT_BURST_BACKOFF_MIN_MS,
    DEFAULT_BURST_THRESHOLD, DEFAULT_BURST_WINDOW_MS, DEFAULT_CALLBACK_WORKERS,
    DEFAULT_MAX_THROTTLE_RETRIES, DEFAULT_NETWORK_THREADS, DEFAULT_PAGE_SIZE,
    DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_SHUTDOWN_TIMEOUT_SECS, DEFAULT_THROTTLE_BACKOFF_MAX_MS,
    DEFAULT_THROTTLE_BACKOFF_MIN_MS, DEFAULT_USER_AGENT,
};
use crate::errors::{RednitError, Result};

/// Client configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub base_url: String,
    #[serde(skip_serializing)]
    pub auth_token: String,
    pub user_agent: String,
    pub request_timeout_secs: u64,
    pub network_threads: usize,
    pub page_size: u32,
    pub dispatch: DispatchConfig,
    pub rate_limit: RateLimitConfig,
    pub callbacks: CallbackConfig,
}

/// Provider-throttle (429) retry configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Retries allowed after a 429 before the dispatch fails.
    pub max_throttle_retries: u32,
    pub throttle_backoff_min_ms: u64,
    pub throttle_backoff_max_ms: u64,
}

/// Local burst policy configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    pub enabled: bool,
    /// Two attempts closer than this count as a burst.
    pub window_ms: u64,
    /// Consecutive bursts tolerated before a delay is imposed.
    pub burst_threshold: u32,
    pub backoff_min_ms: u64,
    pub backoff_max_ms: u64,
}

/// Callback pool configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CallbackConfig {
    pub workers: usize,
    pub shutdown_timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            auth_token: String::new(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            network_threads: DEFAULT_NETWORK_THREADS,
            page_size: DEFAULT_PAGE_SIZE,
            dispatch: DispatchConfig::default(),
            rate_limit: RateLimitConfig::default(),
            callbacks: CallbackConfig::default(),
        }
    }
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            max_throttle_retries: DEFAULT_MAX_THROTTLE_RETRIES,
            throttle_backoff_min_ms: DEFAULT_THROTTLE_BACKOFF_MIN_MS,
            throttle_backoff_max_ms: DEFAULT_THROTTLE_BACKOFF_MAX_MS,
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            window_ms: DEFAULT_BURST_WINDOW_MS,
            burst_threshold: DEFAULT_BURST_THRESHOLD,
            backoff_min_ms: DEFAULT_BURST_BACKOFF_MIN_MS,
            backoff_max_ms: DEFAULT_BURST_BACKOFF_MAX_MS,
        }
    }
}

impl Default for CallbackConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_CALLBACK_WORKERS,
            shutdown_timeout_secs: DEFAULT_SHUTDOWN_TIMEOUT_SECS,
        }
    }
}

impl ClientConfig {
    /// Default configuration authenticated with `auth_token`.
    pub fn with_token(auth_token: impl Into<String>) -> Self {
        Self { auth_token: auth_token.into(), ..Self::default() }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Validate the configuration
    ///
    /// # Errors
    /// Returns `RednitError::Config` naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        if self.auth_token.trim().is_empty() {
            return Err(RednitError::Config("auth_token must not be empty".into()));
        }
        if self.base_url.trim().is_empty() {
            return Err(RednitError::Config("base_url must not be empty".into()));
        }
        if self.network_threads == 0 {
            return Err(RednitError::Config("network_threads must be greater than 0".into()));
        }
        if self.page_size == 0 {
            return Err(RednitError::Config("page_size must be greater than 0".into()));
        }
        self.dispatch.validate()?;
        self.rate_limit.validate()?;
        self.callbacks.validate()
    }
}

impl DispatchConfig {
    pub fn throttle_backoff_ms(&self) -> RangeInclusive<u64> {
        self.throttle_backoff_min_ms..=self.throttle_backoff_max_ms
    }

    pub fn validate(&self) -> Result<()> {
        if self.throttle_backoff_min_ms > self.throttle_backoff_max_ms {
            return Err(RednitError::Config(
                "throttle_backoff_min_ms must not exceed throttle_backoff_max_ms".into(),
            ));
        }
        Ok(())
    }
}

impl RateLimitConfig {
    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }

    pub fn backoff_ms(&self) -> RangeInclusive<u64> {
        self.backoff_min_ms..=self.backoff_max_ms
    }

    pub fn validate(&self) -> Result<()> {
        if self.backoff_min_ms > self.backoff_max_ms {
            return Err(RednitError::Config(
                "rate_limit backoff_min_ms must not exceed backoff_max_ms".into(),
            ));
        }
        Ok(())
    }
}

impl CallbackConfig {
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }

    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(RednitError::Config("callbacks.workers must be greater than 0".into()));
        }
        Ok(())
    }
}
