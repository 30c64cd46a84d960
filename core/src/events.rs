//! Client Events
//!
//! Events sent from the client to an embedding UI. The UI renders what it
//! is told; all conversation logic stays in the core. Delivery is
//! best-effort: a disconnected or slow receiver never blocks or fails an
//! exchange.

use crate::exchange::{ExchangeId, ExchangeState};
use crate::messages::{MessageId, MessageRole};

/// Events from the client to a UI surface
#[derive(Clone, Debug)]
pub enum ClientEvent {
    /// A message was appended to the session log
    MessageAppended {
        /// The new message's ID
        id: MessageId,
        /// Who authored it
        role: MessageRole,
    },

    /// The in-flight assistant message changed
    ///
    /// Carries the full accumulated text, not a delta, so a renderer can
    /// always repaint from the latest event alone.
    AssistantText {
        /// Message being streamed into
        message_id: MessageId,
        /// Full text so far
        text: String,
    },

    /// An exchange reached a terminal state
    ExchangeEnded {
        /// The exchange that ended
        exchange_id: ExchangeId,
        /// Its terminal state
        state: ExchangeState,
    },

    /// Synthesized audio is ready for a completed reply
    SpeechReady {
        /// The exchange whose reply was synthesized
        exchange_id: ExchangeId,
        /// Where the audio can be fetched
        audio_url: String,
    },
}
