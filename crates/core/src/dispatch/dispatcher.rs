//! Request dispatcher with local pacing and 429 retry

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use rednit_domain::{DispatchConfig, RawResponse, RednitError, Result, TransportRequest};
use tracing::{debug, instrument, warn};

use super::Request;
use crate::clock::saturating_millis;
use crate::ports::{RateLimiter, Transport};

/// Sends requests through the transport, pacing them with the rate limiter
/// and retrying provider throttles.
///
/// Per attempt: consult the rate limiter (sleeping if it asks for a delay),
/// send, then classify the status. A 2xx is returned, a 429 is retried after
/// a random backoff until `max_throttle_retries` is used up, anything else
/// is a fatal [`RednitError::HttpStatus`]. Transport failures are returned
/// as-is and never retried.
pub struct Dispatcher {
    transport: Arc<dyn Transport>,
    rate_limiter: Arc<dyn RateLimiter>,
    base_url: String,
    headers: Vec<(String, String)>,
    config: DispatchConfig,
}

impl Dispatcher {
    pub fn new(
        transport: Arc<dyn Transport>,
        rate_limiter: Arc<dyn RateLimiter>,
        base_url: impl Into<String>,
        headers: Vec<(String, String)>,
        config: DispatchConfig,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { transport, rate_limiter, base_url, headers, config }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn rate_limiter(&self) -> &Arc<dyn RateLimiter> {
        &self.rate_limiter
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// Dispatch `request` until it succeeds or fails fatally.
    ///
    /// # Errors
    /// - `RednitError::Transport` when no response was received
    /// - `RednitError::HttpStatus` for any non-2xx, non-429 status
    /// - `RednitError::ThrottleExhausted` once the 429 retry cap is passed
    #[instrument(skip_all, fields(route = %request.route()))]
    pub async fn dispatch(&self, request: &Request) -> Result<RawResponse> {
        let mut throttled: u32 = 0;

        loop {
            if self.rate_limiter.should_delay(request) {
                let delay = self.rate_limiter.delay(request);
                debug!(delay_ms = saturating_millis(delay), "Rate limiter delaying request");
                sleep(delay).await;
            }

            debug!(attempt = throttled + 1, "Sending request");
            let response = self.transport.send(self.transport_request(request)).await?;

            if response.is_ok() {
                debug!(status = response.status(), "Request succeeded");
                return Ok(response);
            }

            if response.is_rate_limit() {
                throttled += 1;
                if throttled > self.config.max_throttle_retries {
                    warn!(attempts = throttled, "Provider kept throttling, giving up");
                    return Err(RednitError::ThrottleExhausted { attempts: throttled });
                }
                let backoff = self.throttle_backoff();
                warn!(
                    attempt = throttled,
                    backoff_ms = saturating_millis(backoff),
                    "Encountered 429, retrying after backoff"
                );
                sleep(backoff).await;
                continue;
            }

            let status = response.status();
            debug!(status, "Request failed");
            return Err(RednitError::HttpStatus { status, body: response.text() });
        }
    }

    fn transport_request(&self, request: &Request) -> TransportRequest {
        TransportRequest {
            method: request.route().method(),
            url: format!("{}{}", self.base_url, request.route().path()),
            headers: self.headers.clone(),
            body: request.body().map(<[u8]>::to_vec),
        }
    }

    fn throttle_backoff(&self) -> Duration {
        let range = self.config.throttle_backoff_ms();
        if range.is_empty() {
            return Duration::from_millis(*range.start());
        }
        Duration::from_millis(rand::thread_rng().gen_range(range))
    }
}

async fn sleep(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}
