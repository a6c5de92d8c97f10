//! reqwest transport
//!
//! Sends requests over HTTPS with reqwest and rustls.

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use super::{ApiRequest, ApiResponse, HttpTransport, TransportError};

/// Production transport backed by a shared `reqwest::Client`.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }

    /// Use a preconfigured client (timeouts, proxies, ...).
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            "Timeout"
        } else if err.is_connect() {
            "Connect"
        } else if err.is_redirect() {
            "Redirect"
        } else if err.is_body() {
            "Body"
        } else if err.is_decode() {
            "Decode"
        } else if err.is_request() {
            "Request"
        } else {
            "Http"
        };
        TransportError::new(kind, err.to_string())
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn post_json(&self, request: &ApiRequest) -> Result<ApiResponse, TransportError> {
        let response = self
            .client
            .post(&request.url)
            .basic_auth(&request.username, Some(&request.password))
            .json(&request.body)
            .send()
            .await?;

        let status = response.status();
        // Read the whole body so the connection goes back to the pool.
        let body = response.text().await?;

        debug!(status = %status, bytes = body.len(), "Bento API responded");

        Ok(ApiResponse {
            status: status.as_u16(),
            reason: status.canonical_reason().map(str::to_string),
            body: Some(body),
        })
    }

    fn name(&self) -> &'static str {
        "reqwest"
    }
}
