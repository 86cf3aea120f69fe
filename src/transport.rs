//! HTTP transport
//!
//! The client talks to the service through the [`Transport`] trait so tests (and
//! embedders with their own HTTP stack) can swap the network layer out.
//! [`HttpTransport`] is the default implementation on top of `reqwest`.

use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::protocol::Endpoint;
use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, HeaderMap};
use std::time::Duration;
use url::Url;

/// Raw response from a single POST
#[derive(Clone, Debug)]
pub struct TransportResponse {
    /// HTTP status code
    pub status: u16,
    /// Status line reason phrase (may be empty)
    pub reason: String,
    /// Response headers
    pub headers: HeaderMap,
    /// Response body decoded as UTF-8
    pub body: String,
}

impl TransportResponse {
    /// Build a response with no headers
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        let reason = reqwest::StatusCode::from_u16(status)
            .ok()
            .and_then(|s| s.canonical_reason())
            .unwrap_or_default()
            .to_string();
        Self {
            status,
            reason,
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }

    /// Return the body of a 200 response, or a status error for anything else
    pub fn into_ok_body(self) -> Result<String> {
        if self.status == 200 {
            return Ok(self.body);
        }
        let message = if self.reason.is_empty() {
            self.body
        } else {
            self.reason
        };
        Err(Error::Status {
            status: self.status,
            message,
        })
    }
}

/// Performs a single body-less POST against the service
///
/// Implementations must bound every call by their configured timeout and report an
/// elapsed timeout as [`Error::Timeout`]; other network failures are
/// [`Error::Transport`]. Any HTTP status is a successful transport call.
#[async_trait]
pub trait Transport: Send + Sync {
    /// POST to `endpoint` with the given query parameters
    async fn post(&self, endpoint: Endpoint, query: &[(&str, &str)]) -> Result<TransportResponse>;
}

/// `reqwest`-backed transport with a pooled keep-alive client
#[derive(Clone, Debug)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: Url,
    timeout: Duration,
}

impl HttpTransport {
    /// Build a transport for the given configuration
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the base URL is invalid and [`Error::Transport`]
    /// if the HTTP client cannot be built.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let base_url = config.parsed_base_url()?;
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::Transport(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url,
            timeout: config.timeout,
        })
    }

    /// Full URL for an endpoint, preserving any path prefix on the base URL
    pub fn endpoint_url(&self, endpoint: Endpoint) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| Error::config("base_url", "URL cannot be used as a base"))?
            .pop_if_empty()
            .extend(endpoint.segments());
        Ok(url)
    }

    fn classify(&self, e: reqwest::Error) -> Error {
        if e.is_timeout() {
            Error::Timeout {
                after: self.timeout,
            }
        } else if e.is_connect() {
            Error::Transport(format!("connection failed: {e}"))
        } else {
            Error::Transport(e.to_string())
        }
    }

    async fn send(&self, url: Url, query: &[(&str, &str)]) -> Result<TransportResponse> {
        let response = self
            .client
            .post(url)
            .query(query)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body("")
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response.text().await.map_err(|e| self.classify(e))?;

        Ok(TransportResponse {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or_default().to_string(),
            headers,
            body,
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post(&self, endpoint: Endpoint, query: &[(&str, &str)]) -> Result<TransportResponse> {
        let url = self.endpoint_url(endpoint)?;
        tracing::debug!(url = %url, "POST");

        // reqwest enforces the timeout too; the outer bound also covers body streaming
        match tokio::time::timeout(self.timeout, self.send(url, query)).await {
            Ok(result) => result,
            Err(_) => Err(Error::Timeout {
                after: self.timeout,
            }),
        }
    }
}
