//! Owns the network runtime and the callback pool
//!
//! Every dispatch runs as a task on a dedicated multi-thread tokio runtime,
//! so `queue()` never blocks its caller and `complete()` can park a plain
//! thread on the result.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use rednit_domain::{ClientConfig, DispatchConfig, RawResponse, RednitError, Result};
use tokio::runtime::{Builder, Handle, Runtime};
use tracing::{debug, error};

use crate::callback::continuation::panic_message;
use crate::callback::CallbackScheduler;
use crate::dispatch::{Decoder, Dispatcher, RequestDescriptor};
use crate::ports::{RateLimiter, Transport};
use crate::ratelimit::{BurstRateLimiter, UnlimitedRateLimiter};

/// Shared handle to the dispatcher, runtime and callback pool
///
/// Cheap to clone. The runtime is torn down when the last clone is dropped.
#[derive(Clone)]
pub struct Requester {
    inner: Arc<RequesterInner>,
}

struct RequesterInner {
    runtime: Option<Runtime>,
    handle: Handle,
    dispatcher: Arc<Dispatcher>,
    scheduler: Arc<CallbackScheduler>,
}

impl Drop for RequesterInner {
    fn drop(&mut self) {
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}

impl Requester {
    pub fn builder(transport: Arc<dyn Transport>) -> RequesterBuilder {
        RequesterBuilder::new(transport)
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.inner.dispatcher
    }

    pub fn scheduler(&self) -> &Arc<CallbackScheduler> {
        &self.inner.scheduler
    }

    /// Stop accepting queued work and wait for in-flight work to finish.
    ///
    /// # Errors
    /// See [`CallbackScheduler::shutdown`].
    pub fn shutdown(&self, timeout: Duration) -> Result<()> {
        self.inner.scheduler.shutdown(timeout)
    }

    /// Dispatch and decode on the network runtime, then hand the outcome to
    /// the descriptor's completion.
    pub(crate) fn submit<T: Send + 'static>(&self, descriptor: RequestDescriptor<T>) {
        let dispatcher = Arc::clone(&self.inner.dispatcher);
        self.inner.handle.spawn(async move {
            let RequestDescriptor { request, decoder, completion } = descriptor;
            let dispatched = AssertUnwindSafe(dispatcher.dispatch(&request)).catch_unwind().await;
            let outcome = match dispatched {
                Ok(Ok(response)) => decode(&decoder, response),
                Ok(Err(error)) => Err(error),
                Err(payload) => {
                    let message = panic_message(payload.as_ref());
                    error!(route = %request.route(), panic = %message, "Dispatch panicked");
                    Err(RednitError::Transport(format!("transport panicked: {message}")))
                }
            };
            completion.complete(outcome);
        });
    }
}

fn decode<T>(decoder: &Decoder<T>, response: RawResponse) -> Result<T> {
    catch_unwind(AssertUnwindSafe(|| decoder(response))).unwrap_or_else(|payload| {
        Err(RednitError::Parsing(format!("decoder panicked: {}", panic_message(payload.as_ref()))))
    })
}

/// Builder for [`Requester`]
pub struct RequesterBuilder {
    transport: Arc<dyn Transport>,
    rate_limiter: Option<Arc<dyn RateLimiter>>,
    base_url: String,
    headers: Vec<(String, String)>,
    dispatch: DispatchConfig,
    network_threads: usize,
    callback_workers: usize,
}

impl RequesterBuilder {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        let config = ClientConfig::default();
        Self {
            transport,
            rate_limiter: None,
            base_url: config.base_url,
            headers: Vec::new(),
            dispatch: config.dispatch,
            network_threads: config.network_threads,
            callback_workers: config.callbacks.workers,
        }
    }

    /// Take base URL, pool sizes, retry and rate-limit policy from `config`.
    ///
    /// Headers are not derived from the config; set them with
    /// [`headers`](Self::headers).
    pub fn config(mut self, config: &ClientConfig) -> Self {
        self.base_url = config.base_url.clone();
        self.dispatch = config.dispatch.clone();
        self.network_threads = config.network_threads;
        self.callback_workers = config.callbacks.workers;
        if self.rate_limiter.is_none() {
            self.rate_limiter = Some(if config.rate_limit.enabled {
                Arc::new(BurstRateLimiter::new(&config.rate_limit))
            } else {
                Arc::new(UnlimitedRateLimiter)
            });
        }
        self
    }

    pub fn rate_limiter(mut self, rate_limiter: Arc<dyn RateLimiter>) -> Self {
        self.rate_limiter = Some(rate_limiter);
        self
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Fixed headers sent with every request.
    pub fn headers(mut self, headers: Vec<(String, String)>) -> Self {
        self.headers = headers;
        self
    }

    pub fn dispatch(mut self, dispatch: DispatchConfig) -> Self {
        self.dispatch = dispatch;
        self
    }

    pub fn network_threads(mut self, threads: usize) -> Self {
        self.network_threads = threads;
        self
    }

    pub fn callback_workers(mut self, workers: usize) -> Self {
        self.callback_workers = workers;
        self
    }

    /// # Errors
    /// Returns `RednitError::Config` for invalid settings or when the runtime
    /// or callback threads cannot be started.
    pub fn build(self) -> Result<Requester> {
        if self.network_threads == 0 {
            return Err(RednitError::Config("network_threads must be greater than 0".into()));
        }
        self.dispatch.validate()?;

        let runtime = Builder::new_multi_thread()
            .worker_threads(self.network_threads)
            .thread_name("rednit-net")
            .enable_all()
            .build()
            .map_err(|e| RednitError::Config(format!("failed to start network runtime: {e}")))?;
        let scheduler = Arc::new(CallbackScheduler::new(self.callback_workers)?);

        let rate_limiter = self.rate_limiter.unwrap_or_else(|| {
            Arc::new(BurstRateLimiter::new(&ClientConfig::default().rate_limit))
        });
        let dispatcher = Arc::new(Dispatcher::new(
            self.transport,
            rate_limiter,
            self.base_url,
            self.headers,
            self.dispatch,
        ));

        debug!(
            network_threads = self.network_threads,
            callback_workers = self.callback_workers,
            "Requester started"
        );
        Ok(Requester {
            inner: Arc::new(RequesterInner {
                handle: runtime.handle().clone(),
                runtime: Some(runtime),
                dispatcher,
                scheduler,
            }),
        })
    }
}
