//! Reya CLI
//!
//! A line-oriented REPL over the core client: read a line, send it, render
//! the reply as it streams in. Voice output, when enabled, is announced as
//! an audio URL; playback belongs to whatever the user points at it.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::io::AsyncBufReadExt;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use reya_core::{
    load_config, load_config_from_path, ChatClient, ClientConfig, ClientEvent, ExchangeState,
    HttpBackend, HttpSynthesizer, MessageRole,
};

/// Chat with the Reya assistant from the terminal
#[derive(Debug, Parser)]
#[command(name = "reya", version, about)]
struct Args {
    /// Chat endpoint URL (overrides config file)
    #[arg(long)]
    url: Option<String>,

    /// Speech synthesis endpoint URL (enables voice)
    #[arg(long)]
    voice_url: Option<String>,

    /// Disable speech synthesis even if configured
    #[arg(long)]
    no_voice: bool,

    /// Path to a TOML config file
    #[arg(long)]
    config: Option<PathBuf>,
}

fn resolve_config(args: &Args) -> anyhow::Result<ClientConfig> {
    let mut config = match &args.config {
        Some(path) => load_config_from_path(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => load_config().context("loading config")?,
    };

    if let Some(url) = &args.url {
        config.backend_url = url.clone();
    }
    if let Some(url) = &args.voice_url {
        config.voice_url = Some(url.clone());
        config.voice_enabled = true;
    }
    if args.no_voice {
        config.voice_enabled = false;
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = resolve_config(&args)?;

    let backend = Arc::new(HttpBackend::new(
        &config.backend_url,
        config.connect_timeout(),
    ));

    let (event_tx, event_rx) = mpsc::channel(256);
    let mut client = ChatClient::new(backend)
        .with_policy(config.stream_policy())
        .with_events(event_tx);

    if config.voice_enabled {
        if let Some(url) = &config.voice_url {
            client = client.with_synthesizer(Arc::new(HttpSynthesizer::new(url)));
        } else {
            tracing::warn!("voice enabled but no synthesis URL configured");
        }
    }

    if !client.backend_healthy().await {
        eprintln!(
            "warning: assistant service at {} is not answering",
            config.backend_url
        );
    }

    let renderer = tokio::spawn(render_events(event_rx));

    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();

    prompt()?;
    while let Some(line) = lines.next_line().await? {
        match line.trim() {
            "" => {}
            "/quit" | "/exit" => break,
            text => {
                if let Some(handle) = client.send(text).await {
                    handle.wait().await;
                }
            }
        }
        prompt()?;
    }

    // Dropping the client revokes any in-flight exchange and closes the
    // event channel, which ends the renderer.
    drop(client);
    let _ = renderer.await;
    Ok(())
}

fn prompt() -> anyhow::Result<()> {
    print!("you> ");
    std::io::stdout().flush()?;
    Ok(())
}

/// Render client events as streaming terminal output
async fn render_events(mut events: mpsc::Receiver<ClientEvent>) {
    // Reply text already on screen; it only grows, except when an error
    // string replaces it.
    let mut shown = String::new();

    while let Some(event) = events.recv().await {
        match event {
            ClientEvent::MessageAppended { role, .. } => {
                if role == MessageRole::Assistant {
                    shown.clear();
                    print!("reya> ");
                    let _ = std::io::stdout().flush();
                }
            }
            ClientEvent::AssistantText { text, .. } => {
                if text.starts_with(&shown) {
                    print!("{}", &text[shown.len()..]);
                } else {
                    // Replacement text (stream failure): start the line over.
                    print!("\nreya> {text}");
                }
                shown = text;
                let _ = std::io::stdout().flush();
            }
            ClientEvent::ExchangeEnded { state, .. } => {
                println!();
                if state == ExchangeState::Cancelled {
                    println!("(cancelled)");
                }
            }
            ClientEvent::SpeechReady { audio_url, .. } => {
                println!("[audio] {audio_url}");
            }
        }
    }
}
