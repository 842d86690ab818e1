//! Outgoing requests and how their outcome is delivered

use std::sync::Arc;

use rednit_domain::{CompiledRoute, RawResponse, RednitError, Result};
use serde::Serialize;
use tokio::sync::oneshot;

use crate::callback::{continuation, FailureCallback, SuccessCallback, Ticket};

/// Turns a successful response into the action's value
pub type Decoder<T> = Arc<dyn Fn(RawResponse) -> Result<T> + Send + Sync>;

/// A compiled route plus an optional request body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    route: CompiledRoute,
    body: Option<Vec<u8>>,
}

impl Request {
    pub fn new(route: CompiledRoute) -> Self {
        Self { route, body: None }
    }

    pub fn with_body(route: CompiledRoute, body: impl Into<Vec<u8>>) -> Self {
        Self { route, body: Some(body.into()) }
    }

    /// Request whose body is `payload` serialized as JSON.
    ///
    /// # Errors
    /// Returns `RednitError::Parsing` if `payload` cannot be serialized.
    pub fn json<P: Serialize + ?Sized>(route: CompiledRoute, payload: &P) -> Result<Self> {
        let body = serde_json::to_vec(payload)
            .map_err(|e| RednitError::Parsing(format!("failed to encode request body: {e}")))?;
        Ok(Self::with_body(route, body))
    }

    pub fn route(&self) -> &CompiledRoute {
        &self.route
    }

    pub fn body(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }
}

/// Where the outcome of one dispatch goes
pub(crate) enum Completion<T> {
    /// Continuations run on the callback pool through a reserved slot.
    Callbacks { ticket: Ticket, on_success: SuccessCallback<T>, on_failure: FailureCallback },
    /// A `complete()` caller is parked on the receiving end.
    Blocking(oneshot::Sender<Result<T>>),
}

impl<T: Send + 'static> Completion<T> {
    pub(crate) fn complete(self, outcome: Result<T>) {
        match self {
            Self::Callbacks { ticket, on_success, on_failure } => {
                ticket.deliver(move || continuation::deliver(outcome, on_success, on_failure));
            }
            Self::Blocking(sender) => {
                // The receiver is gone only if the waiting caller went away.
                let _ = sender.send(outcome);
            }
        }
    }
}

/// Everything one dispatch needs, consumed exactly once
pub(crate) struct RequestDescriptor<T> {
    pub(crate) request: Request,
    pub(crate) decoder: Decoder<T>,
    pub(crate) completion: Completion<T>,
}
