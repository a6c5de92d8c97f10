//! Recording transport for tests and dry runs

use super::{ApiRequest, ApiResponse, HttpTransport, TransportError};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Transport that captures requests and replays a scripted outcome
#[derive(Clone)]
pub struct RecordingTransport {
    requests: Arc<Mutex<Vec<ApiRequest>>>,
    outcome: Result<ApiResponse, TransportError>,
}

impl RecordingTransport {
    /// Answer every request with `202 Accepted` and an empty body
    pub fn new() -> Self {
        Self::responding(ApiResponse::new(202, Some("Accepted"), Some("")))
    }

    /// Answer every request with the given response
    pub fn responding(response: ApiResponse) -> Self {
        Self {
            requests: Arc::new(Mutex::new(Vec::new())),
            outcome: Ok(response),
        }
    }

    /// Fail every request below HTTP
    pub fn failing(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            requests: Arc::new(Mutex::new(Vec::new())),
            outcome: Err(TransportError::new(kind, message)),
        }
    }

    /// Get all captured requests
    pub async fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().await.clone()
    }

    /// Get the count of captured requests
    pub async fn request_count(&self) -> usize {
        self.requests.lock().await.len()
    }

    /// Most recent captured request
    pub async fn last_request(&self) -> Option<ApiRequest> {
        self.requests.lock().await.last().cloned()
    }

    /// Clear all captured requests
    pub async fn clear(&self) {
        self.requests.lock().await.clear();
    }
}

impl Default for RecordingTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpTransport for RecordingTransport {
    async fn post_json(&self, request: &ApiRequest) -> Result<ApiResponse, TransportError> {
        self.requests.lock().await.push(request.clone());
        self.outcome.clone()
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}
