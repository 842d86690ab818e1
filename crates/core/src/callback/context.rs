//! Task-local marker for code running inside a continuation

use std::fmt;

tokio::task_local! {
    static CALLBACK_CONTEXT: CallbackContext;
}

/// Where a continuation is running
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackOrigin {
    /// On the callback pool worker with this index.
    Worker(usize),
    /// On the caller's thread, for actions that were already resolved.
    Inline,
}

/// Marker in scope while a continuation runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallbackContext {
    origin: CallbackOrigin,
}

impl CallbackContext {
    pub(crate) fn new(origin: CallbackOrigin) -> Self {
        Self { origin }
    }

    pub fn origin(&self) -> CallbackOrigin {
        self.origin
    }

    /// The context of the continuation running on this thread, if any.
    pub fn current() -> Option<Self> {
        CALLBACK_CONTEXT.try_with(|context| *context).ok()
    }

    pub fn is_active() -> bool {
        Self::current().is_some()
    }

    /// Run `f` with this context in scope.
    pub(crate) fn scope<R>(self, f: impl FnOnce() -> R) -> R {
        CALLBACK_CONTEXT.sync_scope(self, f)
    }
}

impl fmt::Display for CallbackOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Worker(index) => write!(f, "worker-{index}"),
            Self::Inline => f.write_str("inline"),
        }
    }
}
