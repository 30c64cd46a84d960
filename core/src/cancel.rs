//! Exchange Cancellation
//!
//! One controller per conversation session hands out one token per
//! exchange. At most one token is live at a time: starting a new exchange
//! supersedes the previous one, and tearing the session down revokes
//! whatever is live. The streaming consumer checks liveness before every
//! observable mutation and after resuming from every await, which is what
//! keeps a stale exchange from ever touching the conversation once a newer
//! one has started.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};

/// Issues and revokes exchange tokens for a single session
///
/// Generation 0 means "nothing live". `begin` bumps the generation and
/// cancels the previous token, so supersession needs no bookkeeping from
/// callers.
#[derive(Debug)]
pub struct CancellationController {
    /// Generation of the currently live token (0 = none)
    live: Arc<AtomicU64>,
    /// Cancellation source for the live generation
    current: CancellationToken,
    /// Last generation handed out
    next_generation: u64,
}

impl CancellationController {
    /// Create a controller with no live token
    #[must_use]
    pub fn new() -> Self {
        Self {
            live: Arc::new(AtomicU64::new(0)),
            current: CancellationToken::new(),
            next_generation: 0,
        }
    }

    /// Issue a fresh token, revoking the previously live one
    pub fn begin(&mut self) -> ExchangeToken {
        self.current.cancel();
        self.next_generation += 1;
        let generation = self.next_generation;
        self.current = CancellationToken::new();
        self.live.store(generation, Ordering::SeqCst);
        ExchangeToken {
            generation,
            live: Arc::clone(&self.live),
            token: self.current.clone(),
        }
    }

    /// Revoke a specific token
    ///
    /// Revoking a token that has already been superseded is a no-op for the
    /// live exchange.
    pub fn cancel(&mut self, token: &ExchangeToken) {
        token.token.cancel();
        // Only clear the live slot if this token still holds it.
        let _ = self.live.compare_exchange(
            token.generation,
            0,
            Ordering::SeqCst,
            Ordering::SeqCst,
        );
    }

    /// Revoke whatever token is live, if any
    pub fn cancel_active(&mut self) {
        self.current.cancel();
        self.live.store(0, Ordering::SeqCst);
    }

    /// Check whether a token is still authorized to mutate session state
    #[must_use]
    pub fn is_live(&self, token: &ExchangeToken) -> bool {
        token.is_live()
    }
}

impl Default for CancellationController {
    fn default() -> Self {
        Self::new()
    }
}

/// Opaque token held by one exchange
///
/// Cheap to clone; all clones observe the same revocation.
#[derive(Clone, Debug)]
pub struct ExchangeToken {
    generation: u64,
    live: Arc<AtomicU64>,
    token: CancellationToken,
}

impl ExchangeToken {
    /// Whether this token is still the live one for its session
    #[must_use]
    pub fn is_live(&self) -> bool {
        !self.token.is_cancelled() && self.live.load(Ordering::SeqCst) == self.generation
    }

    /// Resolves once this token has been revoked
    ///
    /// Used to race a chunk pull against cancellation; the resolved pull may
    /// still carry one final chunk, whose effect is suppressed by
    /// [`ExchangeToken::is_live`].
    pub fn cancelled(&self) -> WaitForCancellationFuture<'_> {
        self.token.cancelled()
    }
}
