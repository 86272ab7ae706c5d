//! Session status store on top of [`SharedStorage`]

use crate::status::{SESSION_STATUS_STORAGE_KEY, SessionStatus};
use crate::storage::{SharedStorage, StorageEvent};
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::RecvError};

/// Publishes and reads the session status shared by all contexts
#[derive(Clone)]
pub struct StatusStore {
    storage: Arc<dyn SharedStorage>,
}

impl StatusStore {
    pub fn new(storage: Arc<dyn SharedStorage>) -> Self {
        Self { storage }
    }

    /// Write `status` unless it is already stored
    ///
    /// Returns whether a write (and therefore a notification) happened.
    pub fn publish(&self, status: SessionStatus) -> bool {
        self.storage
            .set_item(SESSION_STATUS_STORAGE_KEY, status.as_str())
    }

    /// Last published status, [`SessionStatus::Unauthenticated`] when none
    #[must_use]
    pub fn read(&self) -> SessionStatus {
        self.storage
            .get_item(SESSION_STATUS_STORAGE_KEY)
            .and_then(|value| value.parse().ok())
            .unwrap_or(SessionStatus::Unauthenticated)
    }

    /// Remove the stored status
    pub fn clear(&self) {
        self.storage.remove_item(SESSION_STATUS_STORAGE_KEY);
    }

    /// Drop whatever a previous page lifetime left behind and publish `initial`
    pub fn reset(&self, initial: SessionStatus) {
        self.clear();
        self.publish(initial);
        tracing::debug!(status = %initial, "set initial session status");
    }

    #[must_use]
    pub fn subscribe(&self) -> StatusSubscription {
        StatusSubscription {
            rx: self.storage.subscribe(),
        }
    }
}

/// A status transition observed on the shared storage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusChange {
    pub old: Option<SessionStatus>,
    /// `None` when the status was cleared
    pub new: Option<SessionStatus>,
}

/// Stream of status changes, ignoring every other storage key
pub struct StatusSubscription {
    rx: broadcast::Receiver<StorageEvent>,
}

impl StatusSubscription {
    /// Wait for the next status change
    ///
    /// Returns `None` once the storage is gone.
    pub async fn recv(&mut self) -> Option<StatusChange> {
        loop {
            match self.rx.recv().await {
                Ok(event) => {
                    if let Some(change) = Self::filter(&event) {
                        return Some(change);
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "status subscriber lagged behind");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    fn filter(event: &StorageEvent) -> Option<StatusChange> {
        if event.key != SESSION_STATUS_STORAGE_KEY {
            return None;
        }
        let new = match event.new_value.as_deref() {
            Some(value) => match value.parse() {
                Ok(status) => Some(status),
                Err(err) => {
                    tracing::debug!(%err, "ignoring unparsable session status");
                    return None;
                }
            },
            None => None,
        };
        let old = event.old_value.as_deref().and_then(|v| v.parse().ok());
        Some(StatusChange { old, new })
    }
}
