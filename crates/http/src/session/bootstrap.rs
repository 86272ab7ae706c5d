//! Initial access token retrieval from the refresh cookie

use super::SessionManager;
use crate::types::TokenGrant;
use nomdoc_core::SessionStatus;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use tokio::task::JoinHandle;

impl SessionManager {
    /// Listen for `Loading` and fetch the first access token once
    ///
    /// The listener holds a weak reference and ends when the manager is
    /// dropped, when the storage closes, or after its single exchange.
    ///
    /// The once-latch is claimed before the exchange starts, not after it
    /// succeeds. A failed attempt therefore is not retried by a later
    /// `Loading`; only one exchange is ever in flight per manager.
    pub fn spawn_bootstrap(self: &Arc<Self>) -> JoinHandle<()> {
        let mut changes = self.store.subscribe();
        let manager = Arc::downgrade(self);

        tokio::spawn(async move {
            while let Some(change) = changes.recv().await {
                if change.new != Some(SessionStatus::Loading) {
                    continue;
                }
                let Some(manager) = manager.upgrade() else {
                    break;
                };
                if manager
                    .has_retrieved_initial_access_token
                    .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                    .is_err()
                {
                    break;
                }
                manager.retrieve_initial_access_token().await;
                break;
            }
            debug!("bootstrap listener stopped");
        })
    }

    async fn retrieve_initial_access_token(&self) {
        debug!("retrieving initial access token");
        match self.api.exchange(TokenGrant::RefreshToken).await {
            Ok(response) => self.establish(response.access_token()),
            Err(err) => {
                debug!(error = %err, "no session to restore");
                self.invalidate();
            }
        }
    }
}
