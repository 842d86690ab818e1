//! Time source abstraction
//!
//! The burst limiter reads the time through [`Clock`] so tests can move time
//! forward without sleeping.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

/// Trait for abstracting time operations
pub trait Clock: Send + Sync + 'static {
    /// Get current instant (monotonic time)
    fn now(&self) -> Instant;
}

/// Real system clock implementation for production use
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

impl<T: Clock> Clock for Arc<T> {
    fn now(&self) -> Instant {
        (**self).now()
    }
}

/// Mock clock for deterministic testing
///
/// Clones share the same elapsed time, so a test can keep one handle and
/// give another to the component under test.
#[derive(Debug, Clone)]
pub struct MockClock {
    start: Instant,
    elapsed: Arc<Mutex<Duration>>,
}

impl MockClock {
    pub fn new() -> Self {
        Self { start: Instant::now(), elapsed: Arc::new(Mutex::new(Duration::ZERO)) }
    }

    pub fn advance(&self, duration: Duration) {
        *self.elapsed.lock() += duration;
    }

    pub fn advance_millis(&self, millis: u64) {
        self.advance(Duration::from_millis(millis));
    }

    pub fn elapsed(&self) -> Duration {
        *self.elapsed.lock()
    }
}

impl Default for MockClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MockClock {
    fn now(&self) -> Instant {
        self.start + *self.elapsed.lock()
    }
}

/// Whole milliseconds in `duration`, saturating at `u64::MAX`.
pub fn saturating_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
