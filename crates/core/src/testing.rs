//! Test doubles for the core ports
//!
//! [`ScriptedTransport`] answers from a queue of canned responses and records
//! every request it receives, so tests can assert on exact network traffic.

use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use rednit_domain::{RawResponse, RednitError, Result, TransportRequest};

use crate::ports::Transport;

/// Transport answering from a script of canned responses
#[derive(Default)]
pub struct ScriptedTransport {
    script: Mutex<VecDeque<Result<RawResponse>>>,
    fallback: Option<RawResponse>,
    latency: Option<Duration>,
    calls: Mutex<Vec<TransportRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response with `status` and `body`.
    pub fn respond(self, status: u16, body: impl Into<Vec<u8>>) -> Self {
        self.push(Ok(RawResponse::new(status, body)));
        self
    }

    /// Queue a transport failure.
    pub fn fail(self, message: &str) -> Self {
        self.push(Err(RednitError::Transport(message.to_string())));
        self
    }

    /// Answer with this response once the script runs out.
    pub fn always(mut self, status: u16, body: impl Into<Vec<u8>>) -> Self {
        self.fallback = Some(RawResponse::new(status, body));
        self
    }

    /// Wait this long before answering each request.
    pub fn latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn push(&self, response: Result<RawResponse>) {
        self.script.lock().push_back(response);
    }

    pub fn calls(&self) -> Vec<TransportRequest> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    /// Paths (without base URL) of every request received, in order.
    pub fn paths(&self, base_url: &str) -> Vec<String> {
        self.calls
            .lock()
            .iter()
            .map(|call| call.url.strip_prefix(base_url).unwrap_or(&call.url).to_string())
            .collect()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: TransportRequest) -> Result<RawResponse> {
        self.calls.lock().push(request);
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        let next = self.script.lock().pop_front();
        match (next, &self.fallback) {
            (Some(response), _) => response,
            (None, Some(fallback)) => Ok(fallback.clone()),
            (None, None) => Err(RednitError::Transport("script exhausted".into())),
        }
    }
}
