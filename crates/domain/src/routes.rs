//! Route templates and the route compiler
//!
//! A [`Route`] is a method plus a path template with `{name}` placeholders.
//! [`Route::compile`] fills the placeholders positionally and yields a
//! [`CompiledRoute`], which never contains an unresolved placeholder.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::{RednitError, Result};

/// HTTP methods used by the provider API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Delete,
}

impl HttpMethod {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An uncompiled route template
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Route {
    method: HttpMethod,
    template: &'static str,
}

impl Route {
    pub const fn new(method: HttpMethod, template: &'static str) -> Self {
        Self { method, template }
    }

    pub const fn method(&self) -> HttpMethod {
        self.method
    }

    pub const fn template(&self) -> &'static str {
        self.template
    }

    /// Resolve the template's placeholders with `params`, in order.
    ///
    /// The template is normalized first: whitespace is removed, a trailing
    /// `/` is dropped and a leading `/` is added when missing. Parameter
    /// values are percent-encoded.
    ///
    /// # Errors
    /// Returns `RednitError::Route` when the number of parameters does not
    /// match the number of placeholders, or a placeholder is unterminated.
    pub fn compile(&self, params: &[&dyn fmt::Display]) -> Result<CompiledRoute> {
        let mut template: String = self.template.chars().filter(|c| !c.is_whitespace()).collect();
        if template.ends_with('/') {
            template.pop();
        }
        if !template.starts_with('/') {
            template.insert(0, '/');
        }

        let mut path = String::with_capacity(template.len());
        let mut rest = template.as_str();
        let mut values = params.iter();

        while let Some(open) = rest.find('{') {
            let close = rest[open..].find('}').map(|offset| open + offset).ok_or_else(|| {
                RednitError::Route(format!("unterminated placeholder in {}", self.template))
            })?;
            let name = &rest[open + 1..close];
            let value = values.next().ok_or_else(|| {
                RednitError::Route(format!(
                    "missing value for placeholder {{{name}}} in {}",
                    self.template
                ))
            })?;

            path.push_str(&rest[..open]);
            path.push_str(&urlencoding::encode(&value.to_string()));
            rest = &rest[close + 1..];
        }
        path.push_str(rest);

        if values.next().is_some() {
            return Err(RednitError::Route(format!(
                "{} parameter(s) supplied for {}, which has fewer placeholders",
                params.len(),
                self.template
            )));
        }

        Ok(CompiledRoute { method: self.method, path })
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.method, self.template)
    }
}

/// A concrete method + path pair ready to be dispatched
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CompiledRoute {
    method: HttpMethod,
    path: String,
}

impl CompiledRoute {
    pub fn method(&self) -> HttpMethod {
        self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

impl fmt::Display for CompiledRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.method, self.path)
    }
}

/// Routes acting on the authenticated account
pub mod profile {
    use super::{HttpMethod, Route};

    pub const GET_SELF: Route = Route::new(HttpMethod::Get, "/profile");
    pub const GET_UPDATES: Route = Route::new(HttpMethod::Post, "/updates");
    pub const GET_RECOMMENDATIONS: Route = Route::new(HttpMethod::Get, "/user/recs");
    pub const GET_LIKED_USERS: Route = Route::new(HttpMethod::Get, "/v2/my-likes");
    pub const GET_LIKE_PREVIEWS: Route = Route::new(HttpMethod::Get, "/v2/fast-match/teasers");
    pub const GET_MESSAGE: Route = Route::new(HttpMethod::Get, "/message/{id}");
    pub const GET_MATCHES: Route = Route::new(HttpMethod::Get, "/v2/matches?count={count}");
    pub const GET_MATCHES_PAGE: Route =
        Route::new(HttpMethod::Get, "/v2/matches?count={count}&page_token={page_token}");
}

/// Routes acting on other users
pub mod user {
    use super::{HttpMethod, Route};

    pub const GET_USER: Route = Route::new(HttpMethod::Get, "/user/{id}");
    pub const LIKE: Route = Route::new(HttpMethod::Post, "/like/{id}");
    pub const PASS: Route = Route::new(HttpMethod::Post, "/pass/{id}");
    pub const SUPER_LIKE: Route = Route::new(HttpMethod::Post, "/like/{id}/super");
}

/// Routes acting on a single match
pub mod matches {
    use super::{HttpMethod, Route};

    pub const GET_MATCH: Route = Route::new(HttpMethod::Get, "/v2/matches/{id}");
    pub const DELETE_MATCH: Route = Route::new(HttpMethod::Delete, "match/{id}");
    pub const SEND_MESSAGE: Route = Route::new(HttpMethod::Post, "user/matches/{id}");
    pub const GET_MESSAGES: Route =
        Route::new(HttpMethod::Get, "/v2/matches/{id}/messages?count={count}");
    pub const GET_MESSAGES_PAGE: Route = Route::new(
        HttpMethod::Get,
        "/v2/matches/{id}/messages?count={count}&page_token={page_token}",
    );
}
