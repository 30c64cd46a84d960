//! Exchange Lifecycle
//!
//! An exchange is one send/receive cycle: the user's request text, the
//! assistant message it streams into, the token that authorizes it to
//! mutate the session, and its position in the state machine. Exchanges are
//! created by [`crate::session::ConversationSession::start_exchange`] and
//! discarded once terminal, never reused.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::cancel::ExchangeToken;
use crate::messages::MessageId;

/// Unique identifier for an exchange
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExchangeId(pub Uuid);

impl ExchangeId {
    /// Create a new unique exchange ID
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ExchangeId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ExchangeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Short form: first 8 chars of UUID
        write!(f, "{}", &self.0.to_string()[..8])
    }
}

/// Where an exchange is in its lifecycle
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExchangeState {
    /// Request issued, no byte received yet
    Opening,
    /// Reply bytes are arriving
    Streaming,
    /// Reply hit the size cap; marker appended, message frozen
    Truncated,
    /// Reply arrived in full
    Completed,
    /// Superseded by a newer exchange or revoked at teardown
    Cancelled,
    /// Could not open, or the transport dropped mid-reply
    Failed,
}

impl ExchangeState {
    /// Check whether this state admits no further transitions
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Opening | Self::Streaming)
    }

    /// Check whether the exchange ended with usable reply text
    ///
    /// Truncation counts as success; only a completed exchange triggers
    /// speech synthesis.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Completed | Self::Truncated)
    }
}

/// One send/receive cycle
#[derive(Debug)]
pub struct Exchange {
    /// Unique exchange identifier
    pub id: ExchangeId,
    /// The text sent to the assistant service
    pub request_text: String,
    /// The assistant message this exchange owns and streams into
    pub message_id: MessageId,
    token: ExchangeToken,
    state: ExchangeState,
    accumulated_chars: usize,
}

impl Exchange {
    pub(crate) fn new(request_text: String, message_id: MessageId, token: ExchangeToken) -> Self {
        Self {
            id: ExchangeId::new(),
            request_text,
            message_id,
            token,
            state: ExchangeState::Opening,
            accumulated_chars: 0,
        }
    }

    /// The token authorizing this exchange to mutate the session
    #[must_use]
    pub fn token(&self) -> &ExchangeToken {
        &self.token
    }

    /// Current lifecycle state
    #[must_use]
    pub fn state(&self) -> ExchangeState {
        self.state
    }

    /// Characters accumulated so far
    #[must_use]
    pub fn accumulated_chars(&self) -> usize {
        self.accumulated_chars
    }

    pub(crate) fn set_state(&mut self, state: ExchangeState) {
        debug_assert!(
            !self.state.is_terminal(),
            "exchange left a terminal state: {:?} -> {state:?}",
            self.state
        );
        self.state = state;
    }

    pub(crate) fn add_chars(&mut self, count: usize) {
        self.accumulated_chars += count;
    }
}
