//! Client constants
//!
//! Centralized location for the defaults used when no configuration value is
//! supplied.

// Provider endpoint and fixed headers
pub const DEFAULT_BASE_URL: &str = "https://api.gotinder.com";
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                                      (KHTML, like Gecko) Chrome/85.0.4183.102 Safari/537.36";
pub const AUTH_TOKEN_HEADER: &str = "X-Auth-Token";
pub const CONTENT_TYPE_JSON: &str = "application/json";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

// Provider throttling (429) retry
pub const DEFAULT_MAX_THROTTLE_RETRIES: u32 = 5;
pub const DEFAULT_THROTTLE_BACKOFF_MIN_MS: u64 = 1_000;
pub const DEFAULT_THROTTLE_BACKOFF_MAX_MS: u64 = 11_000;

// Local burst policy
pub const DEFAULT_BURST_WINDOW_MS: u64 = 5_000;
pub const DEFAULT_BURST_THRESHOLD: u32 = 1;
pub const DEFAULT_BURST_BACKOFF_MIN_MS: u64 = 1_000;
pub const DEFAULT_BURST_BACKOFF_MAX_MS: u64 = 10_000;

// Worker pools
pub const DEFAULT_CALLBACK_WORKERS: usize = 4;
pub const DEFAULT_NETWORK_THREADS: usize = 2;
pub const DEFAULT_SHUTDOWN_TIMEOUT_SECS: u64 = 60;

// Pagination
pub const DEFAULT_PAGE_SIZE: u32 = 60;
pub const NEXT_PAGE_TOKEN_KEY: &str = "next_page_token";
pub const DATA_KEY: &str = "data";
