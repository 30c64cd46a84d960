//! Reply Stream Reading
//!
//! Pulls byte chunks off an open reply body, racing every pull against the
//! exchange token. The sequence is lazy, finite, and non-restartable: after
//! `Done`, `Failed`, or `Cancelled` the reader yields nothing further. No
//! retry happens here; a failed reply is surfaced, not retried.

use bytes::Bytes;
use futures::StreamExt;

use crate::backend::{BackendError, ReplyStream};
use crate::cancel::ExchangeToken;

/// Result of one chunk pull
#[derive(Debug)]
pub enum ReadOutcome {
    /// A chunk of reply bytes
    Chunk(Bytes),
    /// End of stream; yielded once
    Done,
    /// The exchange token was revoked while pulling
    Cancelled,
    /// The transport failed; terminal
    Failed(BackendError),
}

/// Cancellable reader over a reply body
pub struct StreamReader {
    stream: ReplyStream,
    token: ExchangeToken,
    finished: bool,
}

impl StreamReader {
    /// Wrap an open reply body with its exchange token
    #[must_use]
    pub fn new(stream: ReplyStream, token: ExchangeToken) -> Self {
        Self {
            stream,
            token,
            finished: false,
        }
    }

    /// Pull the next chunk
    ///
    /// Suspends until a chunk arrives, the stream ends or fails, or the
    /// token is revoked. A pull that has already resolved with a chunk when
    /// cancellation lands still returns that chunk; the caller's liveness
    /// check suppresses its effect.
    pub async fn next_chunk(&mut self) -> ReadOutcome {
        if self.finished {
            return ReadOutcome::Done;
        }

        tokio::select! {
            () = self.token.cancelled() => {
                self.finished = true;
                ReadOutcome::Cancelled
            }
            next = self.stream.next() => match next {
                Some(Ok(bytes)) => ReadOutcome::Chunk(bytes),
                Some(Err(err)) => {
                    self.finished = true;
                    ReadOutcome::Failed(err)
                }
                None => {
                    self.finished = true;
                    ReadOutcome::Done
                }
            }
        }
    }
}
