//! Error types used throughout the client

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for Rednit
///
/// Every failure reaches the caller through exactly one of these variants,
/// either as the `Err` of `complete()` or as the argument of a failure
/// callback.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum RednitError {
    /// No response was received (connect failure, timeout, broken body).
    #[error("Transport error: {0}")]
    Transport(String),

    /// The provider answered with a non-2xx, non-429 status.
    #[error("Http response returned status code {status}")]
    HttpStatus { status: u16, body: String },

    /// The response body could not be turned into the requested type.
    #[error("Parsing error: {0}")]
    Parsing(String),

    /// The provider kept answering 429 past the configured retry cap.
    #[error("Throttled by the provider {attempts} times in a row, giving up")]
    ThrottleExhausted { attempts: u32 },

    #[error(
        "Preventing use of complete() in callback threads! This operation can be a deadlock cause!"
    )]
    Reentrancy,

    #[error("complete() cannot block inside an async runtime; await the action instead")]
    BlockingInAsyncContext,

    #[error("Timed out after {timeout:?} while waiting for {pending} callback(s) to finish")]
    ShutdownTimeout { timeout: Duration, pending: usize },

    /// A success callback panicked; the panic was redirected here.
    #[error("Callback panicked: {0}")]
    CallbackPanicked(String),

    #[error("A bulk load is already running for this cache")]
    LoadInProgress,

    #[error("Client has been shut down")]
    Shutdown,

    #[error("Route error: {0}")]
    Route(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl RednitError {
    /// HTTP status code carried by the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Stable label suitable for log fields and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Transport(_) => "transport",
            Self::HttpStatus { .. } => "http_status",
            Self::Parsing(_) => "parsing",
            Self::ThrottleExhausted { .. } => "throttle_exhausted",
            Self::Reentrancy => "reentrancy",
            Self::BlockingInAsyncContext => "blocking_in_async_context",
            Self::ShutdownTimeout { .. } => "shutdown_timeout",
            Self::CallbackPanicked(_) => "callback_panicked",
            Self::LoadInProgress => "load_in_progress",
            Self::Shutdown => "shutdown",
            Self::Route(_) => "route",
            Self::Config(_) => "config",
        }
    }

    /// Whether the provider rejected the auth token.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self.status(), Some(401 | 403))
    }
}

/// Result type alias for Rednit operations
pub type Result<T> = std::result::Result<T, RednitError>;
