//! Key/value storage shared by every browser context of one origin
//!
//! Writes are observable by all subscribers, including the context that
//! performed the write. The in-memory implementation stands in for the
//! browser's session storage; other transports (IPC, sockets) implement
//! [`SharedStorage`] the same way.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::broadcast;

/// Default capacity of the change notification channel
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Change notification for one storage key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageEvent {
    pub key: String,
    pub old_value: Option<String>,
    /// `None` when the key was removed
    pub new_value: Option<String>,
}

/// Cross-context key/value channel
pub trait SharedStorage: Send + Sync {
    fn get_item(&self, key: &str) -> Option<String>;

    /// Store `value` under `key` and notify subscribers
    ///
    /// Writing the value already stored is a no-op without notification.
    /// Returns whether a write happened.
    fn set_item(&self, key: &str, value: &str) -> bool;

    /// Remove `key`, notifying subscribers if it was present
    fn remove_item(&self, key: &str);

    fn subscribe(&self) -> broadcast::Receiver<StorageEvent>;
}

/// In-process shared storage, clones observe the same items
#[derive(Clone)]
pub struct MemoryStorage {
    inner: Arc<MemoryStorageInner>,
}

struct MemoryStorageInner {
    items: Mutex<HashMap<String, String>>,
    events: broadcast::Sender<StorageEvent>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(EVENT_CHANNEL_CAPACITY)
    }

    /// Create storage whose notification channel buffers `capacity` events
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (events, _) = broadcast::channel(capacity);
        Self {
            inner: Arc::new(MemoryStorageInner {
                items: Mutex::new(HashMap::new()),
                events,
            }),
        }
    }

    fn notify(&self, event: StorageEvent) {
        // No subscribers is fine, the write already happened
        let _ = self.inner.events.send(event);
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl SharedStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        let items = self
            .inner
            .items
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        items.get(key).cloned()
    }

    fn set_item(&self, key: &str, value: &str) -> bool {
        let mut items = self
            .inner
            .items
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let old_value = items.get(key).cloned();
        if old_value.as_deref() == Some(value) {
            return false;
        }
        items.insert(key.to_string(), value.to_string());
        self.notify(StorageEvent {
            key: key.to_string(),
            old_value,
            new_value: Some(value.to_string()),
        });
        tracing::debug!(key, value, "set storage item");
        true
    }

    fn remove_item(&self, key: &str) {
        let mut items = self
            .inner
            .items
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(old_value) = items.remove(key) {
            self.notify(StorageEvent {
                key: key.to_string(),
                old_value: Some(old_value),
                new_value: None,
            });
        }
        tracing::debug!(key, "removed storage item");
    }

    fn subscribe(&self) -> broadcast::Receiver<StorageEvent> {
        self.inner.events.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::broadcast::error::TryRecvError;

    #[test]
    fn test_set_notifies_all_clones() {
        let storage = MemoryStorage::new();
        let other_tab = storage.clone();
        let mut own = storage.subscribe();
        let mut remote = other_tab.subscribe();

        assert!(storage.set_item("k", "v"));

        let expected = StorageEvent {
            key: "k".to_string(),
            old_value: None,
            new_value: Some("v".to_string()),
        };
        assert_eq!(own.try_recv().unwrap(), expected);
        assert_eq!(remote.try_recv().unwrap(), expected);
        assert_eq!(other_tab.get_item("k").as_deref(), Some("v"));
    }

    #[test]
    fn test_same_value_is_not_rewritten() {
        let storage = MemoryStorage::new();
        let mut rx = storage.subscribe();

        assert!(storage.set_item("k", "v"));
        assert!(!storage.set_item("k", "v"));

        assert!(rx.try_recv().is_ok());
        assert_eq!(rx.try_recv().unwrap_err(), TryRecvError::Empty);
    }

    #[test]
    fn test_remove_reports_old_value() {
        let storage = MemoryStorage::new();
        storage.set_item("k", "v");
        let mut rx = storage.subscribe();

        storage.remove_item("k");
        storage.remove_item("k");

        let event = rx.try_recv().unwrap();
        assert_eq!(event.old_value.as_deref(), Some("v"));
        assert_eq!(event.new_value, None);
        assert_eq!(rx.try_recv().unwrap_err(), TryRecvError::Empty);
        assert_eq!(storage.get_item("k"), None);
    }
}
