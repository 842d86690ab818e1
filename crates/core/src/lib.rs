//! # Rednit Core
//!
//! Request orchestration layer - no HTTP client or configuration loading.
//!
//! This crate contains:
//! - The dispatcher (429 retry, burst rate limiting)
//! - Deferred actions and their callback continuations
//! - The callback pool and its re-entrancy guard
//! - Paginated cache views over matches and messages
//!
//! ## Architecture Principles
//! - Only depends on `rednit-domain`
//! - The network is reached through the [`Transport`] port
//! - Pacing policy is pluggable through the [`RateLimiter`] port

pub mod action;
pub mod callback;
pub mod clock;
pub mod dispatch;
pub mod pagination;
pub mod ports;
pub mod ratelimit;
pub mod requester;
pub mod testing;

pub use action::Action;
pub use callback::{CallbackContext, CallbackOrigin, CallbackScheduler, FailureCallback, SuccessCallback};
pub use clock::{Clock, MockClock, SystemClock};
pub use dispatch::{Dispatcher, Request};
pub use pagination::{
    CacheView, MatchCacheView, MatchPages, MessageCacheView, MessagePages, PageOrder,
    PagedEndpoint, PaginatedCache,
};
pub use ports::{RateLimiter, Transport};
pub use ratelimit::{BurstRateLimiter, UnlimitedRateLimiter};
pub use requester::{Requester, RequesterBuilder};
