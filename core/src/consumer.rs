//! Streaming Response Consumer
//!
//! Drives one exchange from request to terminal state: open the reply,
//! pull and decode chunks, grow the owning assistant message in place,
//! apply the truncation policy, and finally hand a completed reply to the
//! synthesis trigger.
//!
//! The non-negotiable rule here is that liveness is re-checked after every
//! await and before every observable mutation. A consumer that resumes
//! after its exchange was superseded must stop silently; the dangerous
//! failure mode is a stale reply bleeding into a newer conversation turn.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::backend::{ChatBackend, ChatRequest};
use crate::decode::Utf8StreamDecoder;
use crate::events::ClientEvent;
use crate::exchange::{Exchange, ExchangeState};
use crate::session::SharedSession;
use crate::stream::{ReadOutcome, StreamReader};
use crate::synthesis::{normalize_for_speech, SpeechSynthesizer, MAX_SPEECH_CHARS};

/// Default reply cap, in characters
pub const DEFAULT_REPLY_CAP_CHARS: usize = 10_000;

/// Default marker appended when a reply hits the cap
pub const DEFAULT_TRUNCATION_MARKER: &str = "\n[...truncated]";

/// Default text shown in place of a reply that failed mid-stream
pub const DEFAULT_STREAM_ERROR_TEXT: &str =
    "Sorry, something went wrong while generating this reply. Please try again.";

/// Policy knobs for one session's reply streams
#[derive(Clone, Debug)]
pub struct StreamPolicy {
    /// Longest reply kept, in characters
    pub max_reply_chars: usize,
    /// Appended once when the cap is hit
    pub truncation_marker: String,
    /// Replaces the reply text on open or transport failure
    pub error_text: String,
}

impl Default for StreamPolicy {
    fn default() -> Self {
        Self {
            max_reply_chars: DEFAULT_REPLY_CAP_CHARS,
            truncation_marker: DEFAULT_TRUNCATION_MARKER.to_string(),
            error_text: DEFAULT_STREAM_ERROR_TEXT.to_string(),
        }
    }
}

/// What appending a fragment did to the reply
enum Applied {
    Grew,
    Truncated,
}

/// Run one exchange to its terminal state
pub(crate) async fn drive(
    backend: Arc<dyn ChatBackend>,
    session: SharedSession,
    events: Option<mpsc::Sender<ClientEvent>>,
    synthesizer: Option<Arc<dyn SpeechSynthesizer>>,
    policy: StreamPolicy,
    mut exchange: Exchange,
) -> ExchangeState {
    let request = ChatRequest::new(exchange.request_text.clone());

    let opened = backend.open_reply_stream(&request).await;
    if !exchange.token().is_live() {
        return finish(&session, &events, &mut exchange, ExchangeState::Cancelled).await;
    }

    let body = match opened {
        Ok(body) => body,
        Err(err) => {
            tracing::warn!(exchange_id = %exchange.id, error = %err, "failed to open reply");
            set_text(&session, &events, &exchange, policy.error_text.clone()).await;
            return finish(&session, &events, &mut exchange, ExchangeState::Failed).await;
        }
    };

    exchange.set_state(ExchangeState::Streaming);
    let mut reader = StreamReader::new(body, exchange.token().clone());
    let mut decoder = Utf8StreamDecoder::new();
    let mut text = String::new();

    loop {
        match reader.next_chunk().await {
            ReadOutcome::Cancelled => {
                return finish(&session, &events, &mut exchange, ExchangeState::Cancelled).await;
            }

            ReadOutcome::Chunk(bytes) => {
                let fragment = decoder.feed(&bytes);
                if !exchange.token().is_live() {
                    return finish(&session, &events, &mut exchange, ExchangeState::Cancelled)
                        .await;
                }
                if fragment.is_empty() {
                    continue;
                }
                match append_fragment(&mut exchange, &mut text, &fragment, &policy) {
                    Applied::Grew => {
                        set_text(&session, &events, &exchange, text.clone()).await;
                    }
                    Applied::Truncated => {
                        set_text(&session, &events, &exchange, text.clone()).await;
                        return finish(
                            &session,
                            &events,
                            &mut exchange,
                            ExchangeState::Truncated,
                        )
                        .await;
                    }
                }
            }

            ReadOutcome::Done => {
                let tail = decoder.finish();
                if !exchange.token().is_live() {
                    return finish(&session, &events, &mut exchange, ExchangeState::Cancelled)
                        .await;
                }
                if !tail.is_empty() {
                    let applied = append_fragment(&mut exchange, &mut text, &tail, &policy);
                    set_text(&session, &events, &exchange, text.clone()).await;
                    if matches!(applied, Applied::Truncated) {
                        return finish(
                            &session,
                            &events,
                            &mut exchange,
                            ExchangeState::Truncated,
                        )
                        .await;
                    }
                }
                trigger_synthesis(synthesizer, &events, &exchange, &text);
                return finish(&session, &events, &mut exchange, ExchangeState::Completed).await;
            }

            ReadOutcome::Failed(err) => {
                if !exchange.token().is_live() {
                    return finish(&session, &events, &mut exchange, ExchangeState::Cancelled)
                        .await;
                }
                tracing::warn!(exchange_id = %exchange.id, error = %err, "reply stream failed");
                // Partial text is replaced, not merged with the error.
                set_text(&session, &events, &exchange, policy.error_text.clone()).await;
                return finish(&session, &events, &mut exchange, ExchangeState::Failed).await;
            }
        }
    }
}

/// Append a decoded fragment under the cap policy
///
/// Keeps at most `max_reply_chars` characters total; the first fragment to
/// push past the cap is cut there and followed by the marker.
fn append_fragment(
    exchange: &mut Exchange,
    text: &mut String,
    fragment: &str,
    policy: &StreamPolicy,
) -> Applied {
    let fragment_chars = fragment.chars().count();
    let accumulated = exchange.accumulated_chars();

    if accumulated + fragment_chars > policy.max_reply_chars {
        let remaining = policy.max_reply_chars - accumulated;
        text.extend(fragment.chars().take(remaining));
        text.push_str(&policy.truncation_marker);
        exchange.add_chars(remaining);
        Applied::Truncated
    } else {
        text.push_str(fragment);
        exchange.add_chars(fragment_chars);
        Applied::Grew
    }
}

/// Push the full reply text into the owning message and tell the UI
async fn set_text(
    session: &SharedSession,
    events: &Option<mpsc::Sender<ClientEvent>>,
    exchange: &Exchange,
    text: String,
) {
    session
        .lock()
        .update_assistant_text(&exchange.message_id, text.clone());
    emit(
        events,
        ClientEvent::AssistantText {
            message_id: exchange.message_id.clone(),
            text,
        },
    )
    .await;
}

/// Record the terminal state and release the session's active slot
async fn finish(
    session: &SharedSession,
    events: &Option<mpsc::Sender<ClientEvent>>,
    exchange: &mut Exchange,
    state: ExchangeState,
) -> ExchangeState {
    exchange.set_state(state);
    session.lock().finish_exchange(exchange.id);
    tracing::debug!(exchange_id = %exchange.id, ?state, "exchange finished");
    emit(
        events,
        ClientEvent::ExchangeEnded {
            exchange_id: exchange.id,
            state,
        },
    )
    .await;
    state
}

/// Fire-and-forget speech synthesis for a completed reply
///
/// Runs on its own task with its own lifecycle; nothing here can touch the
/// conversation log.
fn trigger_synthesis(
    synthesizer: Option<Arc<dyn SpeechSynthesizer>>,
    events: &Option<mpsc::Sender<ClientEvent>>,
    exchange: &Exchange,
    final_text: &str,
) {
    let Some(engine) = synthesizer else {
        return;
    };
    let speech = normalize_for_speech(final_text, MAX_SPEECH_CHARS);
    if speech.is_empty() {
        tracing::debug!(exchange_id = %exchange.id, "empty reply, skipping synthesis");
        return;
    }

    let events = events.clone();
    let exchange_id = exchange.id;
    tokio::spawn(async move {
        match engine.synthesize(&speech).await {
            Ok(Some(audio)) => {
                tracing::debug!(exchange_id = %exchange_id, url = %audio.audio_url, "reply audio ready");
                emit(
                    &events,
                    ClientEvent::SpeechReady {
                        exchange_id,
                        audio_url: audio.audio_url,
                    },
                )
                .await;
            }
            Ok(None) => {
                tracing::debug!(exchange_id = %exchange_id, "synthesis produced no audio");
            }
            Err(err) => {
                tracing::warn!(exchange_id = %exchange_id, error = %err, "speech synthesis failed");
            }
        }
    });
}

/// Best-effort event delivery; a gone receiver is not an error
async fn emit(events: &Option<mpsc::Sender<ClientEvent>>, event: ClientEvent) {
    if let Some(tx) = events {
        let _ = tx.send(event).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cancel::CancellationController;
    use crate::messages::MessageId;

    fn policy_with_cap(cap: usize) -> StreamPolicy {
        StreamPolicy {
            max_reply_chars: cap,
            ..Default::default()
        }
    }

    fn exchange_for_test() -> Exchange {
        let mut controller = CancellationController::new();
        Exchange::new("q".to_string(), MessageId::new(), controller.begin())
    }

    #[test]
    fn test_append_under_cap_grows() {
        let mut exchange = exchange_for_test();
        let mut text = String::new();
        let policy = policy_with_cap(10);

        assert!(matches!(
            append_fragment(&mut exchange, &mut text, "hello", &policy),
            Applied::Grew
        ));
        assert_eq!(text, "hello");
        assert_eq!(exchange.accumulated_chars(), 5);
    }

    #[test]
    fn test_append_over_cap_truncates_at_boundary() {
        let mut exchange = exchange_for_test();
        let mut text = String::new();
        let policy = policy_with_cap(6);

        append_fragment(&mut exchange, &mut text, "hell", &policy);
        let applied = append_fragment(&mut exchange, &mut text, "o world", &policy);

        assert!(matches!(applied, Applied::Truncated));
        assert_eq!(text, format!("hello {}", policy.truncation_marker));
        assert_eq!(exchange.accumulated_chars(), 6);
    }

    #[test]
    fn test_append_exactly_at_cap_is_not_truncated() {
        let mut exchange = exchange_for_test();
        let mut text = String::new();
        let policy = policy_with_cap(5);

        assert!(matches!(
            append_fragment(&mut exchange, &mut text, "hello", &policy),
            Applied::Grew
        ));
        assert_eq!(text, "hello");
    }

    #[test]
    fn test_cap_counts_characters_not_bytes() {
        let mut exchange = exchange_for_test();
        let mut text = String::new();
        let policy = policy_with_cap(3);

        // Three two-byte scalars fit a three-character cap exactly.
        assert!(matches!(
            append_fragment(&mut exchange, &mut text, "\u{00E9}\u{00E9}\u{00E9}", &policy),
            Applied::Grew
        ));

        let applied = append_fragment(&mut exchange, &mut text, "\u{00E9}", &policy);
        assert!(matches!(applied, Applied::Truncated));
        assert_eq!(
            text,
            format!("\u{00E9}\u{00E9}\u{00E9}{}", policy.truncation_marker)
        );
    }

    #[test]
    fn test_default_policy_values() {
        let policy = StreamPolicy::default();
        assert_eq!(policy.max_reply_chars, 10_000);
        assert_eq!(policy.truncation_marker, "\n[...truncated]");
        assert!(!policy.error_text.is_empty());
    }
}
