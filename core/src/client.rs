//! Chat Client
//!
//! The façade embedders use: owns the shared session, the backend, the
//! stream policy, and the optional synthesis engine, and spawns one
//! consumer task per send. Sending supersedes whatever was streaming;
//! dropping the client (or calling [`ChatClient::cancel`]) revokes the
//! active exchange so a torn-down surface can never be written to again.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::backend::ChatBackend;
use crate::consumer::{self, StreamPolicy};
use crate::events::ClientEvent;
use crate::exchange::{ExchangeId, ExchangeState};
use crate::messages::{MessageId, MessageRole};
use crate::session::{ConversationSession, SharedSession};
use crate::synthesis::SpeechSynthesizer;

/// Client for one conversation with the assistant service
pub struct ChatClient {
    backend: Arc<dyn ChatBackend>,
    session: SharedSession,
    policy: StreamPolicy,
    synthesizer: Option<Arc<dyn SpeechSynthesizer>>,
    events: Option<mpsc::Sender<ClientEvent>>,
}

impl ChatClient {
    /// Create a client over the given backend with default policy
    pub fn new(backend: Arc<dyn ChatBackend>) -> Self {
        Self {
            backend,
            session: Arc::new(parking_lot::Mutex::new(ConversationSession::new())),
            policy: StreamPolicy::default(),
            synthesizer: None,
            events: None,
        }
    }

    /// Set the stream policy
    #[must_use]
    pub fn with_policy(mut self, policy: StreamPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Attach a speech synthesis engine for completed replies
    #[must_use]
    pub fn with_synthesizer(mut self, synthesizer: Arc<dyn SpeechSynthesizer>) -> Self {
        self.synthesizer = Some(synthesizer);
        self
    }

    /// Attach an event channel for a rendering surface
    #[must_use]
    pub fn with_events(mut self, events: mpsc::Sender<ClientEvent>) -> Self {
        self.events = Some(events);
        self
    }

    /// Handle to the shared session, for rendering the message log
    #[must_use]
    pub fn session(&self) -> SharedSession {
        Arc::clone(&self.session)
    }

    /// Whether the assistant service answers its health probe
    pub async fn backend_healthy(&self) -> bool {
        self.backend.health_check().await
    }

    /// Send a user turn and start streaming the reply
    ///
    /// Appends the user message and an empty assistant placeholder, starts
    /// an exchange (superseding any prior one), and spawns the consumer.
    /// Empty or whitespace-only input is ignored and returns `None`.
    pub async fn send(&self, text: &str) -> Option<ExchangeHandle> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return None;
        }

        let (user_id, exchange) = {
            let mut session = self.session.lock();
            let user_id = session.append_user(trimmed);
            let message_id = session.append_assistant_placeholder();
            let exchange = session.start_exchange(trimmed, message_id);
            (user_id, exchange)
        };

        let exchange_id = exchange.id;
        let message_id = exchange.message_id.clone();

        if let Some(tx) = &self.events {
            let _ = tx
                .send(ClientEvent::MessageAppended {
                    id: user_id,
                    role: MessageRole::User,
                })
                .await;
            let _ = tx
                .send(ClientEvent::MessageAppended {
                    id: message_id.clone(),
                    role: MessageRole::Assistant,
                })
                .await;
        }

        let task = tokio::spawn(consumer::drive(
            Arc::clone(&self.backend),
            Arc::clone(&self.session),
            self.events.clone(),
            self.synthesizer.clone(),
            self.policy.clone(),
            exchange,
        ));

        Some(ExchangeHandle {
            id: exchange_id,
            message_id,
            task,
        })
    }

    /// Revoke the active exchange, if any
    ///
    /// The teardown trigger: call when the owning surface goes away, or on
    /// an explicit stop request. Safe to call with nothing in flight.
    pub fn cancel(&self) {
        self.session.lock().cancel_active();
    }
}

impl Drop for ChatClient {
    fn drop(&mut self) {
        // A surface that is gone must not be streamed into.
        self.session.lock().cancel_active();
    }
}

/// Handle to one in-flight exchange
#[derive(Debug)]
pub struct ExchangeHandle {
    /// The exchange's identity
    pub id: ExchangeId,
    /// The assistant message the exchange streams into
    pub message_id: MessageId,
    task: JoinHandle<ExchangeState>,
}

impl ExchangeHandle {
    /// Wait for the exchange to reach its terminal state
    pub async fn wait(self) -> ExchangeState {
        match self.task.await {
            Ok(state) => state,
            Err(err) => {
                tracing::warn!(error = %err, "exchange task aborted");
                ExchangeState::Failed
            }
        }
    }
}
