//! Callback delivery
//!
//! Results of queued actions are handed to a fixed pool of worker threads.
//! While a continuation runs, a [`CallbackContext`] is in scope so blocking
//! waits can detect that they would starve the pool.

mod context;
pub mod continuation;
mod scheduler;

pub use context::{CallbackContext, CallbackOrigin};
pub use continuation::{FailureCallback, SuccessCallback};
pub use scheduler::{CallbackScheduler, Ticket};
