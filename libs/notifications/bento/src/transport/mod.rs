//! HTTP transport implementations

pub mod mock;
pub mod http;

pub use self::mock::RecordingTransport;
pub use self::http::ReqwestTransport;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// A JSON POST with basic authentication.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub url: String,
    pub username: String,
    pub password: String,
    pub body: Value,
}

/// Raw HTTP response as received from the API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    /// Reason phrase of the status line
    pub reason: Option<String>,
    pub body: Option<String>,
}

impl ApiResponse {
    pub fn new(status: u16, reason: Option<&str>, body: Option<&str>) -> Self {
        Self {
            status,
            reason: reason.map(str::to_string),
            body: body.map(str::to_string),
        }
    }
}

/// Failure below HTTP: timeout, refused connection, DNS, TLS.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct TransportError {
    /// Short name of the failure class, e.g. `Timeout`
    pub kind: String,
    pub message: String,
}

impl TransportError {
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
        }
    }
}

/// Trait for HTTP transports
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Send a request and return the response, whatever its status.
    async fn post_json(&self, request: &ApiRequest) -> Result<ApiResponse, TransportError>;

    /// Get transport name
    fn name(&self) -> &'static str;
}
