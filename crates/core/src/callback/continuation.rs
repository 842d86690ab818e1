//! Success and failure continuations
//!
//! A panicking success callback is turned into a call of the failure callback
//! with [`RednitError::CallbackPanicked`]. A panicking failure callback is
//! logged and swallowed.

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};

use rednit_domain::{RednitError, Result};
use tracing::error;

/// Receives the decoded value of a successful action
pub type SuccessCallback<T> = Box<dyn FnOnce(T) + Send + 'static>;

/// Receives the error of a failed action
pub type FailureCallback = Box<dyn FnOnce(RednitError) + Send + 'static>;

pub fn default_success<T>() -> SuccessCallback<T> {
    Box::new(|_| {})
}

/// Logs the error and drops it.
pub fn default_failure() -> FailureCallback {
    Box::new(|error| {
        error!(error = %error, kind = error.label(), "RestAction queue returned failure");
    })
}

/// Route `outcome` to exactly one of the two continuations.
pub(crate) fn deliver<T>(outcome: Result<T>, on_success: SuccessCallback<T>, on_failure: FailureCallback) {
    match outcome {
        Ok(value) => {
            if let Err(payload) = catch_unwind(AssertUnwindSafe(move || on_success(value))) {
                fail(RednitError::CallbackPanicked(panic_message(payload.as_ref())), on_failure);
            }
        }
        Err(error) => fail(error, on_failure),
    }
}

fn fail(error: RednitError, on_failure: FailureCallback) {
    if let Err(payload) = catch_unwind(AssertUnwindSafe(move || on_failure(error))) {
        error!(panic = %panic_message(payload.as_ref()), "Encountered error while processing failure callback");
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
