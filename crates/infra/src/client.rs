//! Client facade
//!
//! [`RednitClient`] wires the reqwest transport, the configured rate limiter
//! and the [`Requester`] together and exposes the provider's operations as
//! [`Action`]s.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use dashmap::DashMap;
use rednit_core::clock::saturating_millis;
use rednit_core::{
    Action, MatchCacheView, MatchPages, MessageCacheView, MessagePages, RateLimiter, Request,
    Requester, Transport,
};
use rednit_domain::constants::{AUTH_TOKEN_HEADER, CONTENT_TYPE_JSON};
use rednit_domain::routes::{matches, profile, user};
use rednit_domain::{ClientConfig, CompiledRoute, Match, Message, Result};
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::config;
use crate::http::ReqwestTransport;

/// Entry point of the library
///
/// Operations build [`Action`]s; nothing is sent until the action is queued,
/// completed or executed.
pub struct RednitClient {
    config: ClientConfig,
    requester: Requester,
    matches: Arc<MatchCacheView>,
    messages: DashMap<String, Arc<MessageCacheView>>,
}

impl RednitClient {
    pub fn builder(config: ClientConfig) -> RednitClientBuilder {
        RednitClientBuilder::new(config)
    }

    /// Client with default settings authenticated with `auth_token`.
    ///
    /// # Errors
    /// Returns `RednitError::Config` for an empty token or when the runtime
    /// cannot be started.
    pub fn new(auth_token: impl Into<String>) -> Result<Self> {
        Self::builder(ClientConfig::with_token(auth_token)).build()
    }

    /// Client configured from the environment or a config file.
    ///
    /// # Errors
    /// See [`config::load`].
    pub fn from_env() -> Result<Self> {
        Self::builder(config::load()?).build()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn requester(&self) -> &Requester {
        &self.requester
    }

    /// Profile of the authenticated account.
    pub fn get_self(&self) -> Result<Action<Value>> {
        self.json_action(profile::GET_SELF.compile(&[])?)
    }

    pub fn get_user(&self, id: &str) -> Result<Action<Value>> {
        self.json_action(user::GET_USER.compile(&[&id])?)
    }

    /// Match with `id`, served from the match cache when already loaded.
    pub fn get_match(&self, id: &str) -> Result<Action<Match>> {
        self.matches.get(id)
    }

    /// Activity since `last_activity_date`, or since now when `None`.
    pub fn get_updates(&self, last_activity_date: Option<DateTime<Utc>>) -> Result<Action<Value>> {
        let since = last_activity_date.unwrap_or_else(Utc::now);
        let body = json!({
            "nudge": true,
            "last_activity_date": since.to_rfc3339_opts(SecondsFormat::Millis, true),
        });
        let request = Request::json(profile::GET_UPDATES.compile(&[])?, &body)?;
        Ok(Action::decoded(&self.requester, request, |response| response.json()))
    }

    pub fn get_recommendations(&self) -> Result<Action<Value>> {
        self.json_action(profile::GET_RECOMMENDATIONS.compile(&[])?)
    }

    pub fn get_liked_users(&self) -> Result<Action<Value>> {
        self.json_action(profile::GET_LIKED_USERS.compile(&[])?)
    }

    pub fn get_like_previews(&self) -> Result<Action<Value>> {
        self.json_action(profile::GET_LIKE_PREVIEWS.compile(&[])?)
    }

    pub fn like(&self, id: &str) -> Result<Action<()>> {
        self.empty_action(user::LIKE.compile(&[&id])?)
    }

    pub fn pass(&self, id: &str) -> Result<Action<()>> {
        self.empty_action(user::PASS.compile(&[&id])?)
    }

    pub fn super_like(&self, id: &str) -> Result<Action<()>> {
        self.empty_action(user::SUPER_LIKE.compile(&[&id])?)
    }

    /// Send `text` to the other side of `match_id`.
    ///
    /// The provider answers with the stored message at the top level of the
    /// body, not inside a `data` envelope.
    pub fn send_message(&self, match_id: &str, text: &str) -> Result<Action<Message>> {
        let route = matches::SEND_MESSAGE.compile(&[&match_id])?;
        let request = Request::json(route, &json!({ "message": text }))?;
        Ok(Action::decoded(&self.requester, request, |response| response.json()))
    }

    /// Remove `match_id` from the local caches and build the delete request.
    ///
    /// The cache entries are dropped immediately, whether or not the
    /// returned action is ever sent.
    pub fn unmatch(&self, match_id: &str) -> Result<Action<()>> {
        let route = matches::DELETE_MATCH.compile(&[&match_id])?;
        let removed = self.matches.cache().remove(match_id);
        self.messages.remove(match_id);
        debug!(match_id, removed, "Match evicted from cache");
        self.empty_action(route)
    }

    /// Shared view over the account's matches.
    pub fn matches(&self) -> &MatchCacheView {
        &self.matches
    }

    /// View over the messages of `match_id`, created on first use.
    pub fn messages(&self, match_id: &str) -> Arc<MessageCacheView> {
        let view = self.messages.entry(match_id.to_string()).or_insert_with(|| {
            Arc::new(MessageCacheView::new(
                self.requester.clone(),
                MessagePages::new(match_id),
                self.config.page_size,
            ))
        });
        Arc::clone(view.value())
    }

    /// Stop accepting work and wait up to `timeout` for queued callbacks.
    ///
    /// # Errors
    /// - `RednitError::Reentrancy` when called from inside a callback
    /// - `RednitError::ShutdownTimeout` when work is still pending at the deadline
    pub fn shutdown(&self, timeout: Duration) -> Result<()> {
        info!(timeout_ms = saturating_millis(timeout), "Shutting down client");
        self.requester.shutdown(timeout)
    }

    /// [`shutdown`](Self::shutdown) with the configured timeout.
    pub fn await_shutdown(&self) -> Result<()> {
        self.shutdown(self.config.callbacks.shutdown_timeout())
    }

    fn json_action(&self, route: CompiledRoute) -> Result<Action<Value>> {
        Ok(Action::decoded(&self.requester, Request::new(route), |response| response.json()))
    }

    fn empty_action(&self, route: CompiledRoute) -> Result<Action<()>> {
        Ok(Action::empty(&self.requester, Request::new(route)))
    }
}

/// Builder for [`RednitClient`]
pub struct RednitClientBuilder {
    config: ClientConfig,
    transport: Option<Arc<dyn Transport>>,
    rate_limiter: Option<Arc<dyn RateLimiter>>,
}

impl RednitClientBuilder {
    pub fn new(config: ClientConfig) -> Self {
        Self { config, transport: None, rate_limiter: None }
    }

    /// Replace the reqwest transport.
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Replace the rate limiter derived from `config.rate_limit`.
    pub fn rate_limiter(mut self, rate_limiter: Arc<dyn RateLimiter>) -> Self {
        self.rate_limiter = Some(rate_limiter);
        self
    }

    /// # Errors
    /// Returns `RednitError::Config` for an invalid configuration or when the
    /// HTTP client, runtime or callback pool cannot be created.
    pub fn build(self) -> Result<RednitClient> {
        let config = self.config;
        config.validate()?;

        let transport: Arc<dyn Transport> = match self.transport {
            Some(transport) => transport,
            None => Arc::new(ReqwestTransport::builder().timeout(config.request_timeout()).build()?),
        };

        let headers = vec![
            ("User-Agent".to_string(), config.user_agent.clone()),
            ("Content-Type".to_string(), CONTENT_TYPE_JSON.to_string()),
            (AUTH_TOKEN_HEADER.to_string(), config.auth_token.clone()),
        ];

        let mut builder = Requester::builder(transport).config(&config).headers(headers);
        if let Some(rate_limiter) = self.rate_limiter {
            builder = builder.rate_limiter(rate_limiter);
        }
        let requester = builder.build()?;

        let matches = Arc::new(MatchCacheView::new(requester.clone(), MatchPages, config.page_size));
        info!(base_url = %config.base_url, "Rednit client ready");

        Ok(RednitClient { config, requester, matches, messages: DashMap::new() })
    }
}
