//! Classification of Bento API responses.

use serde_json::Value;
use tracing::error;

use crate::error::{DeliveryError, DeliveryResult};
use crate::extract::strip;
use crate::transport::ApiResponse;

/// Denial the API returns when the sender is not allowed on the account.
pub const UNAUTHORIZED_AUTHOR_ERROR: &str = "Author not authorized to send on this account";

/// Placeholder when neither the payload nor the status line explain a failure.
pub const UNKNOWN_RESPONSE_MESSAGE: &str = "Unknown response";

pub fn is_success(status: u16) -> bool {
    (200..=299).contains(&status)
}

/// Succeed on 2xx, otherwise raise a [`DeliveryError`] carrying the status
/// and the parsed error payload.
pub fn interpret(response: &ApiResponse) -> DeliveryResult<()> {
    let status = response.status;
    if is_success(status) {
        return Ok(());
    }

    let details = parse_error_payload(response.body.as_deref());
    let error_message = details
        .as_ref()
        .and_then(|payload| payload.get("error"))
        .and_then(render_error_field)
        .or_else(|| response.reason.clone())
        .unwrap_or_else(|| UNKNOWN_RESPONSE_MESSAGE.to_string());

    error!(status, error = %error_message, "Bento API rejected delivery");

    let message = match status {
        401 | 403 => authorization_message(&error_message),
        400..=499 => format!("Client error: {}", error_message),
        500..=599 => format!("Bento API server error: {}", error_message),
        _ => format!("Unexpected response: {} {}", status, error_message),
    };

    Err(DeliveryError::remote(message, status, details))
}

/// Parse a JSON error body. Empty, whitespace-only, or malformed bodies carry no payload.
pub fn parse_error_payload(body: Option<&str>) -> Option<Value> {
    let body = body?.trim();
    if body.is_empty() {
        return None;
    }
    serde_json::from_str(body).ok()
}

/// Strings as-is, other JSON as its text form; `null` and `false` count as absent.
fn render_error_field(value: &Value) -> Option<String> {
    match value {
        Value::Null | Value::Bool(false) => None,
        Value::String(message) => Some(message.clone()),
        other => Some(other.to_string()),
    }
}

fn authorization_message(error_message: &str) -> String {
    if error_message == UNAUTHORIZED_AUTHOR_ERROR {
        return UNAUTHORIZED_AUTHOR_ERROR.to_string();
    }

    let sanitized = Some(error_message)
        .filter(|message| *message != UNKNOWN_RESPONSE_MESSAGE)
        .map(strip)
        .filter(|message| !message.is_empty());

    match sanitized {
        Some(message) => format!("Authorization failed: {}", message),
        None => "Authorization failed".to_string(),
    }
}
