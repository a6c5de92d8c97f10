//! Error types for Bento delivery.

use serde_json::{json, Value};
use thiserror::Error;

use crate::transport::TransportError;

/// Result type for delivery operations.
pub type DeliveryResult<T> = Result<T, DeliveryError>;

/// Broad category of a delivery failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryErrorKind {
    /// Message or settings rejected before any network call
    Validation,
    /// Transport failed before an HTTP response was received
    Network,
    /// The Bento API answered with a non-2xx status
    Remote,
    /// A required dependency could not be loaded
    Configuration,
}

/// A failed delivery.
///
/// Every hard failure of the adapter is reported through this one type. The
/// `Display` output is the human-readable message; the HTTP status and the
/// parsed error payload, when there is one, travel alongside it.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct DeliveryError {
    kind: DeliveryErrorKind,
    message: String,
    response_code: Option<u16>,
    error_details: Option<Value>,
}

impl DeliveryError {
    pub fn new(
        kind: DeliveryErrorKind,
        message: impl Into<String>,
        response_code: Option<u16>,
        error_details: Option<Value>,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            response_code,
            error_details,
        }
    }

    /// Invalid or incomplete input, raised before dispatch.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(DeliveryErrorKind::Validation, message, None, None)
    }

    /// A required delivery setting is absent or blank.
    pub fn missing_setting(name: &str) -> Self {
        Self::validation(format!("Delivery setting {} is required", name))
    }

    /// Wrap a transport failure.
    pub fn network(err: &TransportError) -> Self {
        Self::new(
            DeliveryErrorKind::Network,
            format!("Network error: {}", err.message),
            None,
            Some(json!({ "exception": err.kind })),
        )
    }

    /// Non-success response from the API.
    pub fn remote(message: impl Into<String>, status: u16, details: Option<Value>) -> Self {
        Self::new(DeliveryErrorKind::Remote, message, Some(status), details)
    }

    /// A dependency needed for delivery is unavailable.
    pub fn dependency(
        dependency: &str,
        message: impl Into<String>,
        original_error: impl Into<String>,
    ) -> Self {
        Self::new(
            DeliveryErrorKind::Configuration,
            message,
            None,
            Some(json!({
                "dependency": dependency,
                "original_error": original_error.into(),
            })),
        )
    }

    pub fn kind(&self) -> DeliveryErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// HTTP status of the response, absent for failures without one.
    pub fn response_code(&self) -> Option<u16> {
        self.response_code
    }

    /// Parsed JSON error payload or failure metadata.
    pub fn error_details(&self) -> Option<&Value> {
        self.error_details.as_ref()
    }
}
