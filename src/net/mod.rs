//! HTTP collaborator: the only suspension point of the session core.
//!
//! DESIGN
//! ======
//! The manager speaks to the backend through [`HttpClient`], a single
//! `request` call that yields a parsed JSON response or a [`NetworkError`].
//! Non-2xx statuses are errors at this seam, carrying the server's `message`
//! field so callers can classify them without re-parsing bodies.
//! [`reqwest_client::ReqwestClient`] is the production adapter; tests script
//! responses with a fake.

pub mod api;
pub mod reqwest_client;

use std::fmt;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::ErrorCode;

pub use reqwest_client::ReqwestClient;

// =============================================================================
// CONTRACT
// =============================================================================

#[async_trait::async_trait]
pub trait HttpClient: Send + Sync {
    /// Perform one request. Exactly one outcome per call; no retries.
    async fn request(&self, request: HttpRequest) -> Result<HttpResponse, NetworkError>;
}

// =============================================================================
// REQUEST / RESPONSE
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Method::Get),
            "POST" => Ok(Method::Post),
            "PUT" => Ok(Method::Put),
            "PATCH" => Ok(Method::Patch),
            "DELETE" => Ok(Method::Delete),
            other => Err(format!("unsupported method: {other}")),
        }
    }
}

/// One outgoing call. `path` is relative to the backend base URL.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
    pub headers: Vec<(String, String)>,
}

impl HttpRequest {
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self { method, path: path.into(), body: None, headers: Vec::new() }
    }

    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    #[must_use]
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::Post, path)
    }

    #[must_use]
    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Attach `Authorization` when a bearer value is available.
    #[must_use]
    pub fn bearer(self, bearer: Option<String>) -> Self {
        match bearer {
            Some(value) => self.header(AUTHORIZATION, value),
            None => self,
        }
    }

    #[must_use]
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

pub const AUTHORIZATION: &str = "Authorization";

/// Successful (2xx) response with its JSON body (`Null` when empty).
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Value,
}

impl HttpResponse {
    /// Build a response from a raw 2xx body.
    ///
    /// # Errors
    ///
    /// Returns [`NetworkError::Parse`] if a non-empty body is not JSON.
    pub fn from_text(status: u16, text: &str) -> Result<Self, NetworkError> {
        if text.trim().is_empty() {
            return Ok(Self { status, body: Value::Null });
        }
        let body = serde_json::from_str(text).map_err(|e| NetworkError::Parse(e.to_string()))?;
        Ok(Self { status, body })
    }

    /// Deserialize the body into a typed response.
    ///
    /// # Errors
    ///
    /// Returns [`NetworkError::Parse`] if the body does not match `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, NetworkError> {
        T::deserialize(&self.body).map_err(|e| NetworkError::Parse(e.to_string()))
    }
}

// =============================================================================
// ERROR
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NetworkError {
    /// Connectivity or transport failure before a status was received.
    #[error("request failed: {0}")]
    Transport(String),

    /// The server answered with a non-2xx status.
    #[error("server returned status {status}: {}", .message.as_deref().unwrap_or("no message"))]
    Status { status: u16, message: Option<String>, body: String },

    /// The response body could not be parsed.
    #[error("response parse failed: {0}")]
    Parse(String),

    /// The HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    ClientBuild(String),
}

impl NetworkError {
    /// Classify a non-2xx response, lifting the server's `message` (or
    /// `error`) field out of a JSON body when there is one.
    #[must_use]
    pub fn from_status(status: u16, body: String) -> Self {
        let message = serde_json::from_str::<Value>(&body).ok().and_then(|value| {
            ["message", "error"]
                .iter()
                .find_map(|key| value.get(key).and_then(Value::as_str))
                .map(str::to_owned)
        });
        Self::Status { status, message, body }
    }

    /// Server-provided message for status errors.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Status { message, .. } => message.as_deref(),
            _ => None,
        }
    }

    /// `true` for the login failure that routes to the password reset flow.
    ///
    /// Only the body's `message` key counts; the `error` fallback used for
    /// display never triggers a reset.
    #[must_use]
    pub fn requires_password_reset(&self) -> bool {
        let Self::Status { body, .. } = self else {
            return false;
        };
        serde_json::from_str::<Value>(body).is_ok_and(|value| {
            value.get("message").and_then(Value::as_str) == Some(api::PASSWORD_RESET_MESSAGE)
        })
    }
}

impl ErrorCode for NetworkError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Transport(_) => "E_NETWORK_TRANSPORT",
            Self::Status { .. } => "E_NETWORK_STATUS",
            Self::Parse(_) => "E_NETWORK_PARSE",
            Self::ClientBuild(_) => "E_HTTP_CLIENT_BUILD",
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Status { status: 429 | 500..=599, .. })
    }
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
