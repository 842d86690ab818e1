//! Shared helpers for `rednit-infra` integration tests.
//!
//! The client API blocks, so tests run on a plain thread and drive the mock
//! server through a runtime owned by [`MockApi`].

use rednit_domain::{ClientConfig, DispatchConfig};
use rednit_infra::RednitClient;
use tokio::runtime::{Builder, Runtime};
use wiremock::{Mock, MockServer, Request};

pub const TOKEN: &str = "test-token";

pub struct MockApi {
    runtime: Runtime,
    server: MockServer,
}

impl MockApi {
    pub fn start() -> Self {
        let runtime = Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .build()
            .expect("test runtime should start");
        let server = runtime.block_on(MockServer::start());
        Self { runtime, server }
    }

    pub fn mount(&self, mock: Mock) {
        self.runtime.block_on(mock.mount(&self.server));
    }

    pub fn received(&self) -> Vec<Request> {
        self.runtime.block_on(self.server.received_requests()).unwrap_or_default()
    }

    /// Configuration pointed at the mock server, with no local pacing and
    /// millisecond throttle backoff.
    pub fn config(&self) -> ClientConfig {
        let mut config = ClientConfig::with_token(TOKEN);
        config.base_url = self.server.uri();
        config.network_threads = 1;
        config.page_size = 2;
        config.rate_limit.enabled = false;
        config.callbacks.workers = 2;
        config.dispatch =
            DispatchConfig { max_throttle_retries: 2, throttle_backoff_min_ms: 1, throttle_backoff_max_ms: 2 };
        config
    }

    pub fn client(&self) -> RednitClient {
        RednitClient::builder(self.config()).build().expect("client should build")
    }
}
