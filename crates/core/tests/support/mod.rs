//! Shared helpers for `rednit-core` integration tests.

use std::sync::Arc;

use rednit_core::testing::ScriptedTransport;
use rednit_core::{RateLimiter, Requester, UnlimitedRateLimiter};
use rednit_domain::DispatchConfig;

pub const BASE_URL: &str = "https://api.example.test";

/// Requester over `transport` with no local pacing and millisecond throttle backoff.
pub fn requester(transport: Arc<ScriptedTransport>) -> Requester {
    requester_with(transport, Arc::new(UnlimitedRateLimiter), fast_dispatch())
}

pub fn requester_with(
    transport: Arc<ScriptedTransport>,
    rate_limiter: Arc<dyn RateLimiter>,
    dispatch: DispatchConfig,
) -> Requester {
    Requester::builder(transport)
        .base_url(BASE_URL)
        .rate_limiter(rate_limiter)
        .dispatch(dispatch)
        .network_threads(1)
        .callback_workers(2)
        .build()
        .expect("requester should start")
}

pub fn fast_dispatch() -> DispatchConfig {
    DispatchConfig { max_throttle_retries: 5, throttle_backoff_min_ms: 1, throttle_backoff_max_ms: 2 }
}

/// Page envelope with `count` items numbered from `first`.
pub fn page_body(items_key: &str, prefix: &str, first: usize, count: usize, token: Option<&str>) -> String {
    let items: Vec<serde_json::Value> = (first..first + count)
        .map(|n| serde_json::json!({ "_id": format!("{prefix}{n}"), "message": format!("text {n}") }))
        .collect();
    let mut data = serde_json::Map::new();
    data.insert(items_key.to_string(), serde_json::Value::Array(items));
    if let Some(token) = token {
        data.insert("next_page_token".to_string(), serde_json::Value::String(token.to_string()));
    }
    serde_json::json!({ "data": data }).to_string()
}
