//! Speech Synthesis
//!
//! Optional voice output for completed replies. Synthesis is a side
//! channel: it is triggered fire-and-forget after an exchange completes,
//! and nothing that happens here (engine down, no audio produced) ever
//! alters the text conversation.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

/// Longest text submitted to a synthesis engine, in characters
pub const MAX_SPEECH_CHARS: usize = 8_000;

/// Handle to synthesized audio
#[derive(Clone, Debug)]
pub struct AudioHandle {
    /// Where the audio can be fetched for playback
    pub audio_url: String,
}

/// Errors from a synthesis engine
#[derive(Clone, Debug, Error)]
pub enum SynthesisError {
    /// The engine could not be reached
    #[error("could not reach the synthesis engine: {0}")]
    Connect(String),
    /// The engine refused the request
    #[error("synthesis engine returned HTTP {status}")]
    Status {
        /// HTTP status code
        status: u16,
    },
    /// The engine replied with something unusable
    #[error("unusable synthesis response: {0}")]
    Malformed(String),
}

/// A speech synthesis engine
///
/// `Ok(None)` means the engine handled the request but produced no audio;
/// callers treat that the same as success without playback.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Engine name (for logs)
    fn name(&self) -> &str;

    /// Synthesize the given text
    async fn synthesize(&self, text: &str) -> Result<Option<AudioHandle>, SynthesisError>;
}

/// Collapse whitespace and cap length before handing text to an engine
///
/// Returns an empty string for whitespace-only input, which callers use to
/// skip synthesis entirely.
#[must_use]
pub fn normalize_for_speech(text: &str, max_chars: usize) -> String {
    let collapsed: String = text.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed.chars().take(max_chars).collect()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SynthesisResponse {
    #[serde(default)]
    audio_url: Option<String>,
}

/// HTTP synthesis engine
///
/// Posts `{ "text": ... }` and expects `{ "audioUrl": ... }` back.
#[derive(Clone, Debug)]
pub struct HttpSynthesizer {
    endpoint: String,
    http_client: reqwest::Client,
}

impl HttpSynthesizer {
    /// Create an engine client for the given endpoint
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            http_client: reqwest::Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .unwrap_or_default(),
        }
    }
}

#[async_trait]
impl SpeechSynthesizer for HttpSynthesizer {
    fn name(&self) -> &str {
        "http"
    }

    async fn synthesize(&self, text: &str) -> Result<Option<AudioHandle>, SynthesisError> {
        let response = self
            .http_client
            .post(&self.endpoint)
            .json(&serde_json::json!({ "text": text }))
            .send()
            .await
            .map_err(|e| SynthesisError::Connect(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SynthesisError::Status {
                status: status.as_u16(),
            });
        }

        let body: SynthesisResponse = response
            .json()
            .await
            .map_err(|e| SynthesisError::Malformed(e.to_string()))?;

        Ok(body
            .audio_url
            .filter(|url| !url.is_empty())
            .map(|audio_url| AudioHandle { audio_url }))
    }
}

/// Primary engine with a fallback
///
/// Tries the primary first; on error, logs and tries the fallback. A
/// primary that succeeds with no audio is not retried on the fallback.
pub struct FallbackSynthesizer {
    primary: Box<dyn SpeechSynthesizer>,
    fallback: Box<dyn SpeechSynthesizer>,
}

impl FallbackSynthesizer {
    /// Chain two engines
    #[must_use]
    pub fn new(primary: Box<dyn SpeechSynthesizer>, fallback: Box<dyn SpeechSynthesizer>) -> Self {
        Self { primary, fallback }
    }
}

#[async_trait]
impl SpeechSynthesizer for FallbackSynthesizer {
    fn name(&self) -> &str {
        "fallback"
    }

    async fn synthesize(&self, text: &str) -> Result<Option<AudioHandle>, SynthesisError> {
        match self.primary.synthesize(text).await {
            Ok(audio) => Ok(audio),
            Err(err) => {
                tracing::warn!(
                    engine = self.primary.name(),
                    error = %err,
                    "primary synthesis engine failed, trying fallback"
                );
                self.fallback.synthesize(text).await
            }
        }
    }
}
