//! Reya Core - Headless Streaming Client for the Reya Assistant Service
//!
//! This crate implements the conversation side of a chat-with-voice
//! assistant, completely independent of any UI framework. It can drive a
//! terminal REPL, a GUI, or run headless for testing.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      UI Surface (REPL, GUI)                  │
//! │            send(text)  ↓            ↑  ClientEvent           │
//! └────────────────────────┼────────────┼────────────────────────┘
//! ┌────────────────────────┼────────────┼────────────────────────┐
//! │                        ChatClient                            │
//! │  ┌──────────────┐  ┌──────────────────────────────────────┐  │
//! │  │ Conversation │  │        consumer (one task/send)      │  │
//! │  │   Session    │←─┤ StreamReader → Utf8StreamDecoder →   │  │
//! │  │ + tokens     │  │ cap policy → terminal state          │  │
//! │  └──────────────┘  └───────┬─────────────────┬────────────┘  │
//! │                    ChatBackend (HTTP)   SpeechSynthesizer    │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! A send appends the user turn and an empty assistant placeholder, then
//! streams the reply into that placeholder in place. Starting a new send
//! supersedes the previous exchange: its token is revoked, and a revoked
//! exchange never mutates the session again, no matter how many of its
//! chunks are still in flight.
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use reya_core::{ChatClient, HttpBackend};
//!
//! #[tokio::main]
//! async fn main() {
//!     let backend = Arc::new(HttpBackend::new(
//!         "http://127.0.0.1:8000/chat",
//!         std::time::Duration::from_secs(10),
//!     ));
//!     let client = ChatClient::new(backend);
//!
//!     if let Some(handle) = client.send("hello there").await {
//!         let state = handle.wait().await;
//!         println!("reply finished: {state:?}");
//!     }
//! }
//! ```
//!
//! # Module Overview
//!
//! - [`messages`]: message records and identity
//! - [`session`]: the ordered conversation log and active exchange
//! - [`cancel`]: exchange tokens and supersession
//! - [`exchange`]: exchange lifecycle and state machine
//! - [`decode`]: incremental UTF-8 decoding across chunk boundaries
//! - [`stream`]: cancellable chunk pulls over a reply body
//! - [`consumer`]: the streaming response state machine
//! - [`backend`]: the assistant service boundary (trait + HTTP)
//! - [`synthesis`]: optional voice output for completed replies
//! - [`client`]: the embedder-facing façade
//! - [`events`]: events pushed to rendering surfaces
//! - [`config`]: TOML + environment configuration

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod backend;
pub mod cancel;
pub mod client;
pub mod config;
pub mod consumer;
pub mod decode;
pub mod events;
pub mod exchange;
pub mod messages;
pub mod session;
pub mod stream;
pub mod synthesis;

// Re-exports for convenience
pub use backend::{BackendError, ChatBackend, ChatRequest, HttpBackend, ReplyStream};
pub use cancel::{CancellationController, ExchangeToken};
pub use client::{ChatClient, ExchangeHandle};
pub use config::{
    default_config_path, load_config, load_config_from_path, ClientConfig, ConfigError,
};
pub use consumer::{
    StreamPolicy, DEFAULT_REPLY_CAP_CHARS, DEFAULT_STREAM_ERROR_TEXT, DEFAULT_TRUNCATION_MARKER,
};
pub use decode::Utf8StreamDecoder;
pub use events::ClientEvent;
pub use exchange::{Exchange, ExchangeId, ExchangeState};
pub use messages::{Message, MessageId, MessageRole};
pub use session::{ConversationSession, SharedSession};
pub use stream::{ReadOutcome, StreamReader};
pub use synthesis::{
    normalize_for_speech, AudioHandle, FallbackSynthesizer, HttpSynthesizer, SpeechSynthesizer,
    SynthesisError, MAX_SPEECH_CHARS,
};
