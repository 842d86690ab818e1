//! Deferred actions
//!
//! An [`Action`] describes one request and how to decode its response. Nothing
//! is sent until it is queued or completed, and every execution sends a
//! fresh request. [`Action::Completed`] wraps a value that is already known,
//! such as a cache hit, behind the same interface.

use std::fmt;
use std::sync::Arc;

use rednit_domain::{CompiledRoute, RawResponse, RednitError, Result};
use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::callback::continuation::{self, default_failure, default_success};
use crate::callback::{CallbackContext, CallbackOrigin, FailureCallback, SuccessCallback};
use crate::dispatch::{Completion, Decoder, Request, RequestDescriptor};
use crate::requester::Requester;

/// A request that has not been executed yet, or a value that needs no request
pub enum Action<T> {
    Live(LiveAction<T>),
    Completed(T),
}

/// An action backed by a network request
pub struct LiveAction<T> {
    requester: Requester,
    request: Request,
    decoder: Decoder<T>,
}

impl<T> Clone for LiveAction<T> {
    fn clone(&self) -> Self {
        Self {
            requester: self.requester.clone(),
            request: self.request.clone(),
            decoder: Arc::clone(&self.decoder),
        }
    }
}

impl<T: Clone> Clone for Action<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Live(action) => Self::Live(action.clone()),
            Self::Completed(value) => Self::Completed(value.clone()),
        }
    }
}

impl<T> fmt::Debug for Action<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Live(action) => f.debug_tuple("Live").field(action.request.route()).finish(),
            Self::Completed(_) => f.write_str("Completed"),
        }
    }
}

impl Action<()> {
    /// Action that discards the response body.
    pub fn empty(requester: &Requester, request: Request) -> Self {
        Self::decoded(requester, request, |_| Ok(()))
    }
}

impl Action<RawResponse> {
    pub fn raw(requester: &Requester, route: CompiledRoute) -> Self {
        Self::decoded(requester, Request::new(route), Ok)
    }
}

impl<T: Send + 'static> Action<T> {
    /// Action whose successful response is turned into `T` by `decoder`.
    pub fn decoded<F>(requester: &Requester, request: Request, decoder: F) -> Self
    where
        F: Fn(RawResponse) -> Result<T> + Send + Sync + 'static,
    {
        Self::Live(LiveAction { requester: requester.clone(), request, decoder: Arc::new(decoder) })
    }

    pub fn completed(value: T) -> Self {
        Self::Completed(value)
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed(_))
    }

    /// The request this action sends, if it is live.
    pub fn request(&self) -> Option<&Request> {
        match self {
            Self::Live(action) => Some(&action.request),
            Self::Completed(_) => None,
        }
    }
}

impl<T: Clone + Send + 'static> Action<T> {
    /// Execute in the background, logging failures and discarding the value.
    pub fn queue(&self) {
        self.queue_callbacks(default_success(), default_failure());
    }

    /// Execute in the background, handing the value to `on_success`.
    pub fn queue_then<S>(&self, on_success: S)
    where
        S: FnOnce(T) + Send + 'static,
    {
        self.queue_callbacks(Box::new(on_success), default_failure());
    }

    /// Execute in the background. Exactly one of the callbacks is invoked, on
    /// the callback pool.
    pub fn queue_with<S, F>(&self, on_success: S, on_failure: F)
    where
        S: FnOnce(T) + Send + 'static,
        F: FnOnce(RednitError) + Send + 'static,
    {
        self.queue_callbacks(Box::new(on_success), Box::new(on_failure));
    }

    pub fn queue_callbacks(&self, on_success: SuccessCallback<T>, on_failure: FailureCallback) {
        match self {
            Self::Live(action) => action.queue(on_success, on_failure),
            Self::Completed(value) => {
                let value = value.clone();
                CallbackContext::new(CallbackOrigin::Inline)
                    .scope(move || continuation::deliver(Ok(value), on_success, on_failure));
            }
        }
    }

    /// Execute and block the calling thread until the outcome is known.
    ///
    /// # Errors
    /// - `RednitError::Reentrancy` when called from a continuation, before any
    ///   request is sent
    /// - `RednitError::BlockingInAsyncContext` when called on an async runtime
    /// - `RednitError::Shutdown` once the requester has shut down
    /// - any dispatch or decoding error of the request
    pub fn complete(&self) -> Result<T> {
        match self {
            Self::Live(action) => action.complete(),
            Self::Completed(value) => Ok(value.clone()),
        }
    }

    /// Execute and await the outcome.
    ///
    /// # Errors
    /// `RednitError::Shutdown` once the requester has shut down, otherwise any
    /// dispatch or decoding error of the request.
    pub async fn execute(&self) -> Result<T> {
        match self {
            Self::Live(action) => {
                action.ensure_running()?;
                action.submit_blocking().await.map_err(|_| RednitError::Shutdown)?
            }
            Self::Completed(value) => Ok(value.clone()),
        }
    }
}

impl<T: Send + 'static> LiveAction<T> {
    fn descriptor(&self, completion: Completion<T>) -> RequestDescriptor<T> {
        RequestDescriptor {
            request: self.request.clone(),
            decoder: Arc::clone(&self.decoder),
            completion,
        }
    }

    fn queue(&self, on_success: SuccessCallback<T>, on_failure: FailureCallback) {
        let ticket = match self.requester.scheduler().reserve() {
            Ok(ticket) => ticket,
            Err(error) => {
                warn!(route = %self.request.route(), "Client is shut down, rejecting queued request");
                CallbackContext::new(CallbackOrigin::Inline)
                    .scope(move || continuation::deliver(Err(error), on_success, on_failure));
                return;
            }
        };

        debug!(route = %self.request.route(), "Queueing request");
        self.requester.submit(self.descriptor(Completion::Callbacks { ticket, on_success, on_failure }));
    }

    fn complete(&self) -> Result<T> {
        if CallbackContext::is_active() {
            return Err(RednitError::Reentrancy);
        }
        if tokio::runtime::Handle::try_current().is_ok() {
            return Err(RednitError::BlockingInAsyncContext);
        }
        self.ensure_running()?;

        debug!(route = %self.request.route(), "Completing request");
        self.submit_blocking().blocking_recv().map_err(|_| RednitError::Shutdown)?
    }

    fn ensure_running(&self) -> Result<()> {
        if self.requester.scheduler().is_shut_down() {
            warn!(route = %self.request.route(), "Client is shut down, rejecting request");
            return Err(RednitError::Shutdown);
        }
        Ok(())
    }

    fn submit_blocking(&self) -> oneshot::Receiver<Result<T>> {
        let (sender, receiver) = oneshot::channel();
        self.requester.submit(self.descriptor(Completion::Blocking(sender)));
        receiver
    }
}
