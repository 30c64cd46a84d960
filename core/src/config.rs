//! Client Configuration
//!
//! Centralized configuration loading for the client, supporting a TOML file
//! at `~/.config/reya/client.toml`.
//!
//! # Configuration Priority
//!
//! Values are loaded with the following priority (highest first):
//! 1. CLI arguments (applied by the binary)
//! 2. Environment variables (`REYA_*`)
//! 3. TOML configuration file
//! 4. Default values
//!
//! # Example Configuration
//!
//! ```toml
//! [backend]
//! url = "http://127.0.0.1:8000/chat"
//! connect_timeout_ms = 10000
//!
//! [reply]
//! max_chars = 10000
//! truncation_marker = "\n[...truncated]"
//!
//! [voice]
//! enabled = true
//! url = "http://127.0.0.1:8000/synthesize"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::backend::DEFAULT_CONNECT_TIMEOUT_MS;
use crate::consumer::{StreamPolicy, DEFAULT_REPLY_CAP_CHARS, DEFAULT_TRUNCATION_MARKER};

/// Default chat endpoint
pub const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:8000/chat";

/// Errors that can occur when loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("failed to read config file at {path}: {source}")]
    ReadError {
        /// The path that was attempted
        path: PathBuf,
        /// The underlying IO error
        source: std::io::Error,
    },

    /// Failed to parse TOML
    #[error("failed to parse TOML config: {0}")]
    ParseError(#[from] toml::de::Error),
}

/// Resolved client configuration
#[derive(Clone, Debug, PartialEq)]
pub struct ClientConfig {
    /// Chat endpoint URL
    pub backend_url: String,
    /// Connect timeout for the chat endpoint, in milliseconds
    pub connect_timeout_ms: u64,
    /// Longest reply kept, in characters
    pub max_reply_chars: usize,
    /// Marker appended when a reply hits the cap
    pub truncation_marker: String,
    /// Whether completed replies are sent to a synthesis engine
    pub voice_enabled: bool,
    /// Synthesis endpoint URL, if any
    pub voice_url: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT_MS,
            max_reply_chars: DEFAULT_REPLY_CAP_CHARS,
            truncation_marker: DEFAULT_TRUNCATION_MARKER.to_string(),
            voice_enabled: false,
            voice_url: None,
        }
    }
}

impl ClientConfig {
    /// Stream policy derived from this configuration
    #[must_use]
    pub fn stream_policy(&self) -> StreamPolicy {
        StreamPolicy {
            max_reply_chars: self.max_reply_chars,
            truncation_marker: self.truncation_marker.clone(),
            ..Default::default()
        }
    }

    /// Connect timeout as a [`Duration`]
    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

// =============================================================================
// TOML file shape
// =============================================================================

/// Backend section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendToml {
    /// Chat endpoint URL
    pub url: Option<String>,
    /// Connect timeout in milliseconds
    pub connect_timeout_ms: Option<u64>,
}

/// Reply section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplyToml {
    /// Longest reply kept, in characters
    pub max_chars: Option<usize>,
    /// Marker appended when a reply hits the cap
    pub truncation_marker: Option<String>,
}

/// Voice section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceToml {
    /// Whether synthesis is on
    pub enabled: Option<bool>,
    /// Synthesis endpoint URL
    pub url: Option<String>,
}

/// Top-level TOML configuration file
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientToml {
    /// `[backend]` section
    pub backend: BackendToml,
    /// `[reply]` section
    pub reply: ReplyToml,
    /// `[voice]` section
    pub voice: VoiceToml,
}

impl ClientToml {
    fn apply(self, config: &mut ClientConfig) {
        if let Some(url) = self.backend.url {
            config.backend_url = url;
        }
        if let Some(ms) = self.backend.connect_timeout_ms {
            config.connect_timeout_ms = ms;
        }
        if let Some(max) = self.reply.max_chars {
            config.max_reply_chars = max;
        }
        if let Some(marker) = self.reply.truncation_marker {
            config.truncation_marker = marker;
        }
        if let Some(enabled) = self.voice.enabled {
            config.voice_enabled = enabled;
        }
        if let Some(url) = self.voice.url {
            config.voice_url = Some(url);
        }
    }
}

// =============================================================================
// Loading
// =============================================================================

/// XDG path of the configuration file
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("reya").join("client.toml"))
}

/// Load configuration from an explicit path
///
/// The file must exist and parse; use [`load_config`] for the tolerant
/// default-path variant.
pub fn load_config_from_path(path: &Path) -> Result<ClientConfig, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadError {
        path: path.to_path_buf(),
        source,
    })?;
    let file: ClientToml = toml::from_str(&raw)?;

    let mut config = ClientConfig::default();
    file.apply(&mut config);
    apply_env(&mut config, |key| std::env::var(key).ok());
    Ok(config)
}

/// Load configuration from the default path, if present
///
/// A missing file is not an error: defaults plus environment overrides are
/// returned. A file that exists but does not parse is an error.
pub fn load_config() -> Result<ClientConfig, ConfigError> {
    match default_config_path() {
        Some(path) if path.exists() => load_config_from_path(&path),
        _ => {
            let mut config = ClientConfig::default();
            apply_env(&mut config, |key| std::env::var(key).ok());
            Ok(config)
        }
    }
}

/// Apply `REYA_*` environment overrides
fn apply_env<F>(config: &mut ClientConfig, get: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(url) = get("REYA_BACKEND_URL") {
        config.backend_url = url;
    }
    if let Some(url) = get("REYA_VOICE_URL") {
        config.voice_url = Some(url);
    }
    if let Some(enabled) = get("REYA_VOICE_ENABLED") {
        config.voice_enabled = matches!(enabled.as_str(), "1" | "true" | "yes");
    }
    if let Some(max) = get("REYA_REPLY_MAX_CHARS") {
        match max.parse() {
            Ok(value) => config.max_reply_chars = value,
            Err(_) => tracing::warn!(value = %max, "ignoring bad REYA_REPLY_MAX_CHARS"),
        }
    }
}
