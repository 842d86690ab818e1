use std::time::Duration;

use async_trait::async_trait;
use rednit_core::Transport;
use rednit_domain::{HttpMethod, RawResponse, RednitError, Result, TransportRequest};
use reqwest::{Client as ReqwestClient, Method};
use tracing::debug;

use crate::errors::InfraError;

/// [`Transport`] sending requests with a shared reqwest client.
///
/// Performs exactly one HTTP call per `send`; retries and pacing belong to
/// the dispatcher.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: ReqwestClient,
}

impl ReqwestTransport {
    /// Start building a new transport.
    pub fn builder() -> ReqwestTransportBuilder {
        ReqwestTransportBuilder::default()
    }

    /// Convenience constructor with default configuration.
    pub fn new() -> Result<Self> {
        Self::builder().build()
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: TransportRequest) -> Result<RawResponse> {
        let method = to_method(request.method);
        debug!(%method, url = %request.url, "sending HTTP request");

        let mut builder = self.client.request(method.clone(), &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(|err| {
            debug!(%method, url = %request.url, error = %err, "HTTP request failed");
            RednitError::from(InfraError::from(err))
        })?;
        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(|err| RednitError::from(InfraError::from(err)))?;
        debug!(%method, url = %request.url, status, "received HTTP response");

        Ok(RawResponse::new(status, body.to_vec()))
    }
}

fn to_method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Delete => Method::DELETE,
    }
}

/// Builder for [`ReqwestTransport`].
#[derive(Debug)]
pub struct ReqwestTransportBuilder {
    timeout: Duration,
    user_agent: Option<String>,
}

impl Default for ReqwestTransportBuilder {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(rednit_domain::constants::DEFAULT_REQUEST_TIMEOUT_SECS),
            user_agent: None,
        }
    }
}

impl ReqwestTransportBuilder {
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    pub fn build(self) -> Result<ReqwestTransport> {
        let mut builder = ReqwestClient::builder().timeout(self.timeout).no_proxy();

        if let Some(agent) = self.user_agent {
            builder = builder.user_agent(agent);
        }

        let client = builder.build().map_err(|err| RednitError::from(InfraError::from(err)))?;
        Ok(ReqwestTransport { client })
    }
}

#[cfg(test)]
mod tests {
    use std::net::TcpListener;

    use wiremock::matchers::{body_string, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn request(method: HttpMethod, url: String, body: Option<&str>) -> TransportRequest {
        TransportRequest {
            method,
            url,
            headers: vec![("X-Auth-Token".into(), "secret".into())],
            body: body.map(|b| b.as_bytes().to_vec()),
        }
    }

    #[tokio::test]
    async fn sends_method_headers_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/user/matches/m1"))
            .and(header("X-Auth-Token", "secret"))
            .and(body_string(r#"{"message":"hi"}"#))
            .respond_with(ResponseTemplate::new(200).set_body_string("sent"))
            .expect(1)
            .mount(&server)
            .await;

        let transport = ReqwestTransport::new().unwrap();
        let url = format!("{}/user/matches/m1", server.uri());
        let response =
            transport.send(request(HttpMethod::Post, url, Some(r#"{"message":"hi"}"#))).await.unwrap();

        assert_eq!(response.status(), 200);
        assert_eq!(response.text(), "sent");
    }

    #[tokio::test]
    async fn error_statuses_are_returned_not_raised() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .respond_with(ResponseTemplate::new(429))
            .expect(1)
            .mount(&server)
            .await;

        let transport = ReqwestTransport::new().unwrap();
        let response = transport
            .send(request(HttpMethod::Delete, format!("{}/match/m1", server.uri()), None))
            .await
            .unwrap();

        assert!(response.is_rate_limit());
    }

    #[tokio::test]
    async fn network_failure_is_a_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let transport = ReqwestTransport::new().unwrap();
        let result = transport.send(request(HttpMethod::Get, format!("http://{addr}/profile"), None)).await;

        assert!(matches!(result, Err(RednitError::Transport(_))));
    }

    #[tokio::test]
    async fn uses_configured_user_agent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(header("User-Agent", "rednit-test"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let transport = ReqwestTransport::builder().user_agent("rednit-test").build().unwrap();
        let response =
            transport.send(request(HttpMethod::Get, server.uri(), None)).await.unwrap();
        assert!(response.is_ok());
    }
}
