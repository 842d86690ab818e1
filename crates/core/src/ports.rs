//! Port interfaces at the edges of the core
//!
//! Infrastructure implements [`Transport`]; pacing policies implement
//! [`RateLimiter`].

use std::time::Duration;

use async_trait::async_trait;
use rednit_domain::{RawResponse, Result, TransportRequest};

use crate::dispatch::Request;

/// Performs a single HTTP call
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send one request and return whatever status the provider answered with.
    ///
    /// `Err` means no response was received at all; it is never retried.
    async fn send(&self, request: TransportRequest) -> Result<RawResponse>;
}

/// Local pacing policy consulted before every dispatch attempt
///
/// Implementations are shared across network threads and must be safe to
/// call concurrently.
pub trait RateLimiter: Send + Sync {
    /// Record an attempt for `request` and report whether it must wait.
    fn should_delay(&self, request: &Request) -> bool;

    /// How long to wait once [`should_delay`](Self::should_delay) said yes.
    fn delay(&self, request: &Request) -> Duration;
}
