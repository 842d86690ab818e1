use std::io::Error as IoError;

use rednit_domain::RednitError;
use reqwest::Error as HttpError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub RednitError);

impl From<InfraError> for RednitError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<RednitError> for InfraError {
    fn from(value: RednitError) -> Self {
        InfraError(value)
    }
}

trait IntoRednitError {
    fn into_rednit(self) -> RednitError;
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → RednitError */
/* -------------------------------------------------------------------------- */

impl IntoRednitError for HttpError {
    fn into_rednit(self) -> RednitError {
        if self.is_timeout() {
            return RednitError::Transport("HTTP request timed out".into());
        }

        if self.is_connect() {
            return RednitError::Transport(format!("HTTP connection failure: {self}"));
        }

        if self.is_builder() {
            return RednitError::Transport(format!("invalid HTTP request: {self}"));
        }

        if self.is_body() || self.is_decode() {
            return RednitError::Transport(format!("failed to read HTTP response body: {self}"));
        }

        RednitError::Transport(self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        InfraError(value.into_rednit())
    }
}

/* -------------------------------------------------------------------------- */
/* std::io::Error → RednitError */
/* -------------------------------------------------------------------------- */

impl IntoRednitError for IoError {
    fn into_rednit(self) -> RednitError {
        RednitError::Config(format!("I/O error: {self}"))
    }
}

impl From<IoError> for InfraError {
    fn from(value: IoError) -> Self {
        InfraError(value.into_rednit())
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */
