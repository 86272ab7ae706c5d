//! Callers waiting on an in-flight refresh

use crate::client::error::ClientError;
use nomdoc_core::AccessToken;
use std::collections::VecDeque;
use tokio::sync::oneshot;

/// Outcome delivered to a queued caller
pub type RefreshOutcome = Result<AccessToken, ClientError>;

/// FIFO of callers suspended behind the current refresh
#[derive(Debug, Default)]
pub struct RequestQueue {
    waiters: VecDeque<oneshot::Sender<RefreshOutcome>>,
}

impl RequestQueue {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            waiters: VecDeque::new(),
        }
    }

    /// Enqueue a caller and hand back its completion
    pub fn push(&mut self) -> oneshot::Receiver<RefreshOutcome> {
        let (tx, rx) = oneshot::channel();
        self.waiters.push_back(tx);
        debug!(queued = self.waiters.len(), "queued request behind token refresh");
        rx
    }

    /// Deliver `token` to every waiter in arrival order
    ///
    /// Returns the number of waiters drained.
    pub fn resolve(&mut self, token: &AccessToken) -> usize {
        self.drain(|| Ok(token.clone()))
    }

    /// Deliver `error` to every waiter in arrival order
    pub fn reject(&mut self, error: &ClientError) -> usize {
        self.drain(|| Err(error.clone()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.waiters.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.waiters.is_empty()
    }

    fn drain(&mut self, outcome: impl Fn() -> RefreshOutcome) -> usize {
        let drained = self.waiters.len();
        for waiter in self.waiters.drain(..) {
            // Receiver gone means the caller was cancelled
            let _ = waiter.send(outcome());
        }
        if drained > 0 {
            debug!(drained, "drained refresh queue");
        }
        drained
    }
}
