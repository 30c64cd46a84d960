//! HTTP Backend Implementation
//!
//! Talks to the assistant service's chat endpoint over HTTP. The reply body
//! is consumed as a byte stream; no total request timeout is set, since a
//! reply may legitimately stream for a long time. Connect failures and
//! non-success statuses are reported before the first byte, everything
//! after that surfaces as a transport error on the stream itself.

use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;

use super::traits::{BackendError, ChatBackend, ChatRequest, ReplyStream};

/// Default connect timeout in milliseconds
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 10_000;

/// HTTP chat backend
#[derive(Clone, Debug)]
pub struct HttpBackend {
    /// Chat endpoint URL
    endpoint: String,
    /// HTTP client
    http_client: reqwest::Client,
}

impl HttpBackend {
    /// Create a backend for the given chat endpoint
    ///
    /// Falls back to a default client if the builder rejects the
    /// configuration, which only happens on broken TLS setups.
    pub fn new(endpoint: impl Into<String>, connect_timeout: Duration) -> Self {
        let http_client = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .build()
            .unwrap_or_default();
        Self {
            endpoint: endpoint.into(),
            http_client,
        }
    }

    /// The configured chat endpoint
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ChatBackend for HttpBackend {
    fn name(&self) -> &str {
        "http"
    }

    async fn health_check(&self) -> bool {
        self.http_client
            .get(&self.endpoint)
            .timeout(Duration::from_secs(5))
            .send()
            .await
            .is_ok()
    }

    async fn open_reply_stream(&self, request: &ChatRequest) -> Result<ReplyStream, BackendError> {
        let response = self
            .http_client
            .post(&self.endpoint)
            .json(request)
            .send()
            .await
            .map_err(|e| BackendError::Connect(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "chat request rejected");
            return Err(BackendError::Status {
                status: status.as_u16(),
            });
        }

        let stream = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(|e| BackendError::Transport(e.to_string())));
        Ok(Box::pin(stream))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_creation() {
        let backend = HttpBackend::new(
            "http://127.0.0.1:8000/chat",
            Duration::from_millis(DEFAULT_CONNECT_TIMEOUT_MS),
        );
        assert_eq!(backend.endpoint(), "http://127.0.0.1:8000/chat");
        assert_eq!(backend.name(), "http");
    }
}
