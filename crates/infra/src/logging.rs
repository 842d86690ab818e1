//! Tracing subscriber setup
//!
//! The library only emits `tracing` events. Applications that want them on
//! stderr call [`init_tracing`] once at startup; `RUST_LOG` takes precedence
//! over the default directive.

use rednit_domain::{RednitError, Result};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Directive used when `RUST_LOG` is not set.
pub const DEFAULT_DIRECTIVE: &str = "rednit_core=info,rednit_infra=info";

/// Install a global fmt subscriber with the default directive.
///
/// Does nothing if a global subscriber is already installed.
pub fn init_tracing() {
    if let Err(error) = try_init_tracing(DEFAULT_DIRECTIVE) {
        tracing::debug!(error = %error, "Tracing subscriber already installed");
    }
}

/// Install a global fmt subscriber filtered by `RUST_LOG`, or by `directive`
/// when `RUST_LOG` is unset or invalid.
///
/// # Errors
/// Returns `RednitError::Config` if `directive` is invalid or a global
/// subscriber is already installed.
pub fn try_init_tracing(directive: &str) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(directive)
            .map_err(|e| RednitError::Config(format!("invalid tracing directive {directive:?}: {e}")))?,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_thread_names(true))
        .try_init()
        .map_err(|e| RednitError::Config(format!("failed to install tracing subscriber: {e}")))
}

/// Stable label for an error, for log fields and metric names.
pub fn error_label(error: &RednitError) -> &'static str {
    error.label()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_are_snake_case() {
        assert_eq!(error_label(&RednitError::ThrottleExhausted { attempts: 6 }), "throttle_exhausted");
        assert_eq!(error_label(&RednitError::Transport("reset".into())), "transport");
    }

    #[test]
    fn invalid_directive_is_rejected() {
        std::env::remove_var("RUST_LOG");
        let result = try_init_tracing("rednit_core=verbose");
        assert!(matches!(result, Err(RednitError::Config(_))));
    }

    #[test]
    fn second_install_is_reported() {
        init_tracing();
        assert!(try_init_tracing(DEFAULT_DIRECTIVE).is_err());
    }
}
