//! Transport-boundary request and response types

use serde::de::DeserializeOwned;

use crate::errors::{RednitError, Result};
use crate::routes::HttpMethod;

/// One HTTP call as handed to a transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
}

/// Status code and body bytes of a received response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    status: u16,
    body: Vec<u8>,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self { status, body: body.into() }
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn into_body(self) -> Vec<u8> {
        self.body
    }

    pub fn is_ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_rate_limit(&self) -> bool {
        self.status == 429
    }

    /// Neither a success nor a provider throttle.
    pub fn is_error(&self) -> bool {
        !self.is_ok() && !self.is_rate_limit()
    }

    /// Body as text, replacing invalid UTF-8.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Deserialize the body as JSON.
    ///
    /// # Errors
    /// Returns `RednitError::Parsing` when the body is not valid JSON for `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_slice(&self.body).map_err(|e| RednitError::Parsing(e.to_string()))
    }
}
