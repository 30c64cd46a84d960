//! Conversation Messages
//!
//! Message records that make up a conversation log. A message is created
//! once and appended to the session; the only field ever mutated afterwards
//! is the text of an in-flight assistant message, and only by the exchange
//! that owns it. Once that exchange reaches a terminal state the message is
//! frozen.

use serde::{Deserialize, Serialize};

/// Message identifier
///
/// Messages are looked up by id, never by position, so a log that grows
/// while an exchange is in flight can't redirect an update to the wrong
/// message.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub String);

impl MessageId {
    /// Generate a new unique message ID
    pub fn new() -> Self {
        use std::sync::atomic::{AtomicU64, Ordering};
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        let id = COUNTER.fetch_add(1, Ordering::SeqCst);
        Self(format!("msg_{id}"))
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Who authored a message
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// The human user
    User,
    /// The remote assistant
    Assistant,
}

/// A message in the conversation log
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Message {
    /// Unique message ID
    pub id: MessageId,
    /// Who sent this message
    pub role: MessageRole,
    /// Message content
    pub text: String,
    /// When the message was created (Unix timestamp ms)
    pub created_at: u64,
}

impl Message {
    /// Create a user message with final text
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            id: MessageId::new(),
            role: MessageRole::User,
            text: text.into(),
            created_at: now_ms(),
        }
    }

    /// Create an empty assistant placeholder whose text will be streamed in
    pub fn assistant_placeholder() -> Self {
        Self {
            id: MessageId::new(),
            role: MessageRole::Assistant,
            text: String::new(),
            created_at: now_ms(),
        }
    }
}

/// Get current timestamp in milliseconds
pub(crate) fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
