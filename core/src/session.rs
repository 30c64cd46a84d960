//! Conversation Session
//!
//! The ordered message log for one conversation, plus the identity of the
//! exchange currently allowed to stream into it. The log is append-only;
//! display order is insertion order and is never rewritten. The only
//! in-place mutation is the text of the assistant message owned by the
//! active exchange, applied through [`ConversationSession::update_assistant_text`].

use std::sync::Arc;

use crate::cancel::CancellationController;
use crate::exchange::{Exchange, ExchangeId};
use crate::messages::{Message, MessageId, MessageRole};

/// Session shared between the client façade and its consumer tasks
///
/// The lock is held only for synchronous mutations, never across an await.
pub type SharedSession = Arc<parking_lot::Mutex<ConversationSession>>;

/// A conversation session
///
/// Starting an exchange implicitly supersedes the previous one, so callers
/// never cancel by hand before sending again.
#[derive(Debug, Default)]
pub struct ConversationSession {
    messages: Vec<Message>,
    active_exchange: Option<ExchangeId>,
    cancellation: CancellationController,
}

impl ConversationSession {
    /// Create an empty session
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a user turn with final text
    pub fn append_user(&mut self, text: impl Into<String>) -> MessageId {
        let msg = Message::user(text);
        let id = msg.id.clone();
        self.messages.push(msg);
        id
    }

    /// Append an empty assistant placeholder for a reply to stream into
    pub fn append_assistant_placeholder(&mut self) -> MessageId {
        let msg = Message::assistant_placeholder();
        let id = msg.id.clone();
        self.messages.push(msg);
        id
    }

    /// Replace the text of an assistant message
    ///
    /// Returns false if the id is unknown or names a user message. Callers
    /// are expected to hold a live exchange token; the session itself does
    /// not re-check it.
    pub fn update_assistant_text(&mut self, id: &MessageId, text: impl Into<String>) -> bool {
        match self
            .messages
            .iter_mut()
            .find(|m| &m.id == id && m.role == MessageRole::Assistant)
        {
            Some(msg) => {
                msg.text = text.into();
                true
            }
            None => {
                tracing::warn!(message_id = %id, "dropped update for unknown assistant message");
                false
            }
        }
    }

    /// Start an exchange for the given request text
    ///
    /// Issues a fresh token (revoking the previous exchange's token) and
    /// records the new exchange as active. `message_id` names the assistant
    /// placeholder the exchange will stream into.
    pub fn start_exchange(
        &mut self,
        request_text: impl Into<String>,
        message_id: MessageId,
    ) -> Exchange {
        let token = self.cancellation.begin();
        let exchange = Exchange::new(request_text.into(), message_id, token);
        self.active_exchange = Some(exchange.id);
        tracing::debug!(exchange_id = %exchange.id, "exchange started");
        exchange
    }

    /// Record that an exchange reached a terminal state
    ///
    /// Clears the active slot only if this exchange still holds it; a
    /// superseded exchange finishing late must not evict its successor.
    pub fn finish_exchange(&mut self, id: ExchangeId) {
        if self.active_exchange == Some(id) {
            self.active_exchange = None;
        }
    }

    /// Revoke the active exchange's token, if any
    ///
    /// Called on teardown and on explicit user cancellation. The abandoned
    /// exchange stops updating; its placeholder stays as-is.
    pub fn cancel_active(&mut self) {
        if let Some(id) = self.active_exchange.take() {
            tracing::debug!(exchange_id = %id, "active exchange cancelled");
        }
        self.cancellation.cancel_active();
    }

    /// Identity of the exchange currently streaming, if any
    #[must_use]
    pub fn active_exchange(&self) -> Option<ExchangeId> {
        self.active_exchange
    }

    /// Whether a reply is currently in flight
    #[must_use]
    pub fn is_streaming(&self) -> bool {
        self.active_exchange.is_some()
    }

    /// The full ordered message log
    #[must_use]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Get message by ID
    #[must_use]
    pub fn get_message(&self, id: &MessageId) -> Option<&Message> {
        self.messages.iter().find(|m| &m.id == id)
    }

    /// The last N messages, oldest first
    #[must_use]
    pub fn recent_messages(&self, count: usize) -> &[Message] {
        let start = self.messages.len().saturating_sub(count);
        &self.messages[start..]
    }

    /// Number of messages in the log
    #[must_use]
    pub fn message_count(&self) -> usize {
        self.messages.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_preserves_order() {
        let mut session = ConversationSession::new();
        session.append_user("first");
        let placeholder = session.append_assistant_placeholder();
        session.append_user("second");

        let roles: Vec<MessageRole> = session.messages().iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![MessageRole::User, MessageRole::Assistant, MessageRole::User]
        );
        assert_eq!(session.get_message(&placeholder).unwrap().text, "");
    }

    #[test]
    fn test_update_assistant_text_by_id() {
        let mut session = ConversationSession::new();
        session.append_user("hi");
        let id = session.append_assistant_placeholder();

        assert!(session.update_assistant_text(&id, "partial"));
        assert_eq!(session.get_message(&id).unwrap().text, "partial");

        assert!(session.update_assistant_text(&id, "partial grown"));
        assert_eq!(session.get_message(&id).unwrap().text, "partial grown");
    }

    #[test]
    fn test_update_rejects_user_message() {
        let mut session = ConversationSession::new();
        let user_id = session.append_user("hi");
        assert!(!session.update_assistant_text(&user_id, "overwrite"));
        assert_eq!(session.get_message(&user_id).unwrap().text, "hi");
    }

    #[test]
    fn test_update_rejects_unknown_id() {
        let mut session = ConversationSession::new();
        assert!(!session.update_assistant_text(&MessageId::new(), "ghost"));
    }

    #[test]
    fn test_start_exchange_supersedes_previous() {
        let mut session = ConversationSession::new();
        let first_msg = session.append_assistant_placeholder();
        let first = session.start_exchange("one", first_msg);

        let second_msg = session.append_assistant_placeholder();
        let second = session.start_exchange("two", second_msg);

        assert!(!first.token().is_live());
        assert!(second.token().is_live());
        assert_eq!(session.active_exchange(), Some(second.id));
    }

    #[test]
    fn test_finish_exchange_only_clears_own_slot() {
        let mut session = ConversationSession::new();
        let first_msg = session.append_assistant_placeholder();
        let first = session.start_exchange("one", first_msg);
        let second_msg = session.append_assistant_placeholder();
        let second = session.start_exchange("two", second_msg);

        // The superseded exchange finishing late leaves the successor active.
        session.finish_exchange(first.id);
        assert_eq!(session.active_exchange(), Some(second.id));

        session.finish_exchange(second.id);
        assert_eq!(session.active_exchange(), None);
    }

    #[test]
    fn test_cancel_active_revokes_token() {
        let mut session = ConversationSession::new();
        let msg = session.append_assistant_placeholder();
        let exchange = session.start_exchange("one", msg);
        assert!(session.is_streaming());

        session.cancel_active();
        assert!(!exchange.token().is_live());
        assert!(!session.is_streaming());
    }

    #[test]
    fn test_recent_messages() {
        let mut session = ConversationSession::new();
        session.append_user("a");
        session.append_user("b");
        session.append_user("c");

        let recent = session.recent_messages(2);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].text, "b");
        assert_eq!(recent[1].text, "c");

        assert_eq!(session.recent_messages(10).len(), 3);
    }
}
