//! Local request pacing
//!
//! [`BurstRateLimiter`] is the default policy. It is independent of the
//! provider's own 429 throttling, which the dispatcher handles separately.

use std::time::{Duration, Instant};

use parking_lot::Mutex;
use rand::Rng;
use rednit_domain::RateLimitConfig;
use tracing::debug;

use crate::clock::{Clock, SystemClock};
use crate::dispatch::Request;
use crate::ports::RateLimiter;

#[derive(Debug, Default)]
struct BurstState {
    last_request: Option<Instant>,
    bursts: u32,
}

/// Delays a request after repeated bursts of closely spaced attempts
///
/// Every attempt closer than `window` to the previous one counts as a burst.
/// Once the consecutive burst count exceeds `threshold`, the attempt is
/// delayed by a random backoff and the count starts over. An attempt outside
/// the window also starts the count over.
pub struct BurstRateLimiter<C: Clock = SystemClock> {
    clock: C,
    window: Duration,
    threshold: u32,
    backoff_ms: (u64, u64),
    state: Mutex<BurstState>,
}

impl BurstRateLimiter<SystemClock> {
    pub fn new(config: &RateLimitConfig) -> Self {
        Self::with_clock(config, SystemClock)
    }
}

impl<C: Clock> BurstRateLimiter<C> {
    pub fn with_clock(config: &RateLimitConfig, clock: C) -> Self {
        Self {
            clock,
            window: config.window(),
            threshold: config.burst_threshold,
            backoff_ms: (config.backoff_min_ms, config.backoff_max_ms.max(config.backoff_min_ms)),
            state: Mutex::new(BurstState::default()),
        }
    }

    /// Consecutive bursts recorded since the last reset.
    pub fn bursts(&self) -> u32 {
        self.state.lock().bursts
    }
}

impl<C: Clock> RateLimiter for BurstRateLimiter<C> {
    fn should_delay(&self, request: &Request) -> bool {
        let now = self.clock.now();
        let mut state = self.state.lock();
        let previous = state.last_request.replace(now);

        let in_window = previous.is_some_and(|last| now.saturating_duration_since(last) <= self.window);
        if !in_window {
            state.bursts = 0;
            return false;
        }

        state.bursts += 1;
        if state.bursts > self.threshold {
            debug!(route = %request.route(), bursts = state.bursts, "Burst threshold exceeded");
            state.bursts = 0;
            return true;
        }
        false
    }

    fn delay(&self, _request: &Request) -> Duration {
        let (min, max) = self.backoff_ms;
        Duration::from_millis(rand::thread_rng().gen_range(min..=max))
    }
}

/// Never delays
#[derive(Debug, Clone, Copy, Default)]
pub struct UnlimitedRateLimiter;

impl RateLimiter for UnlimitedRateLimiter {
    fn should_delay(&self, _request: &Request) -> bool {
        false
    }

    fn delay(&self, _request: &Request) -> Duration {
        Duration::ZERO
    }
}
