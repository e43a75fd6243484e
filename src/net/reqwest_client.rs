//! Production [`HttpClient`] over `reqwest`.
//!
//! Thin wrapper: join the path onto the base URL, send JSON, and turn the
//! status/body pair into a [`HttpResponse`] or [`NetworkError`]. Parsing lives
//! in `HttpResponse::from_text` and `NetworkError::from_status` so it can be
//! tested without a socket.

use std::time::Duration;

use super::{HttpClient, HttpRequest, HttpResponse, Method, NetworkError};
use crate::config::{ClientConfig, Timeouts};

pub struct ReqwestClient {
    http: reqwest::Client,
    base_url: String,
}

impl ReqwestClient {
    /// # Errors
    ///
    /// Returns [`NetworkError::ClientBuild`] if the TLS backend or client
    /// cannot be initialised.
    pub fn new(base_url: impl Into<String>, timeouts: Timeouts) -> Result<Self, NetworkError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeouts.request_secs))
            .connect_timeout(Duration::from_secs(timeouts.connect_secs))
            .build()
            .map_err(|e| NetworkError::ClientBuild(e.to_string()))?;
        Ok(Self { http, base_url: base_url.into() })
    }

    /// # Errors
    ///
    /// See [`ReqwestClient::new`].
    pub fn from_config(config: &ClientConfig) -> Result<Self, NetworkError> {
        Self::new(config.api_url.clone(), config.timeouts)
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        join_url(&self.base_url, path)
    }
}

pub(crate) fn join_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Patch => reqwest::Method::PATCH,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

#[async_trait::async_trait]
impl HttpClient for ReqwestClient {
    async fn request(&self, request: HttpRequest) -> Result<HttpResponse, NetworkError> {
        let url = self.url(&request.path);
        tracing::debug!(method = %request.method, %url, "sending request");

        let mut builder = self
            .http
            .request(request.method.into(), &url)
            .header("Accept", "application/json");
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| NetworkError::Transport(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| NetworkError::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(NetworkError::from_status(status.as_u16(), text));
        }

        HttpResponse::from_text(status.as_u16(), &text)
    }
}

#[cfg(test)]
#[path = "reqwest_client_test.rs"]
mod tests;
