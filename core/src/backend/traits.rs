//! Assistant Service Traits
//!
//! Trait definitions for the send boundary. The client core only ever asks
//! a backend to open one streamed reply per request; retry, framing, and
//! prompt semantics all live on the other side of this seam. Swapping the
//! HTTP implementation for a scripted one is how the streaming machinery is
//! tested.

use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use serde::Serialize;
use thiserror::Error;

/// A streamed reply body: raw text bytes, arbitrary chunk boundaries
pub type ReplyStream = Pin<Box<dyn Stream<Item = Result<Bytes, BackendError>> + Send>>;

/// Errors from the send boundary
#[derive(Clone, Debug, Error)]
pub enum BackendError {
    /// The request never reached the service
    #[error("could not reach the assistant service: {0}")]
    Connect(String),
    /// The service refused the request
    #[error("assistant service returned HTTP {status}")]
    Status {
        /// HTTP status code
        status: u16,
    },
    /// The connection dropped while the reply was streaming
    #[error("connection lost while streaming: {0}")]
    Transport(String),
}

/// One outbound chat request
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    /// The text to send to the assistant
    pub conversation_text: String,
}

impl ChatRequest {
    /// Create a request from user text
    pub fn new(conversation_text: impl Into<String>) -> Self {
        Self {
            conversation_text: conversation_text.into(),
        }
    }
}

/// Assistant service backend
///
/// Implement this trait to point the client at a different service.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Get the backend name (for logs)
    fn name(&self) -> &str;

    /// Check if the backend is healthy and reachable
    async fn health_check(&self) -> bool;

    /// Send a request and open the streamed reply body
    ///
    /// Success means the response channel is open; bytes may still fail to
    /// arrive, which surfaces as a `Transport` item on the stream.
    async fn open_reply_stream(&self, request: &ChatRequest) -> Result<ReplyStream, BackendError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_wire_field() {
        let request = ChatRequest::new("hi there");
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["conversationText"], "hi there");
    }

    #[test]
    fn test_error_display() {
        let err = BackendError::Status { status: 503 };
        assert_eq!(err.to_string(), "assistant service returned HTTP 503");
    }
}
