// crates/core/src/store/memory.rs
//! In-memory store. Not durable across restarts; used by tests and by
//! embedders that bring their own persistence.

use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::broadcast;

use super::{Entries, Store, StoreChange, CHANGE_CHANNEL_CAPACITY};
use crate::error::StoreError;

/// Map-backed [`Store`].
///
/// Changes are published while the map lock is held, so subscribers see
/// writes to the same key in the order they were applied.
pub struct MemoryStore {
    entries: Mutex<Entries>,
    changes: broadcast::Sender<StoreChange>,
}

impl MemoryStore {
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            entries: Mutex::new(Entries::default()),
            changes,
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Entries>, StoreError> {
        self.entries.lock().map_err(|_| StoreError::Poisoned)
    }

    fn publish(&self, change: Option<StoreChange>) {
        if let Some(change) = change {
            // No subscribers is fine.
            let _ = self.changes.send(change);
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.lock()?.get(key))
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        let mut entries = self.lock()?;
        let change = entries.write(key, Some(value));
        self.publish(change);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        let mut entries = self.lock()?;
        let change = entries.write(key, None);
        self.publish(change);
        Ok(())
    }

    async fn compare_and_swap(
        &self,
        key: &str,
        expected: Option<&Value>,
        new: Option<Value>,
    ) -> Result<bool, StoreError> {
        let mut entries = self.lock()?;
        if !entries.matches(key, expected) {
            return Ok(false);
        }
        let change = entries.write(key, new);
        self.publish(change);
        Ok(true)
    }

    fn subscribe(&self) -> broadcast::Receiver<StoreChange> {
        self.changes.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_set_get_delete() {
        let store = MemoryStore::new();
        assert_eq!(store.get("k").await.unwrap(), None);

        store.set("k", json!({"a": 1})).await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some(json!({"a": 1})));

        store.delete("k").await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), None);

        // Idempotent
        store.delete("k").await.unwrap();
    }

    #[tokio::test]
    async fn test_changes_follow_write_order() {
        let store = MemoryStore::new();
        let mut rx = store.subscribe();

        store.set("k", json!(1)).await.unwrap();
        store.set("k", json!(2)).await.unwrap();
        store.delete("k").await.unwrap();

        let first = rx.recv().await.unwrap();
        assert_eq!(first.new_value, Some(json!(1)));
        let second = rx.recv().await.unwrap();
        assert_eq!(second.old_value, Some(json!(1)));
        assert_eq!(second.new_value, Some(json!(2)));
        let third = rx.recv().await.unwrap();
        assert_eq!(third.new_value, None);
    }

    #[tokio::test]
    async fn test_compare_and_swap() {
        let store = MemoryStore::new();
        store.set("k", json!("old")).await.unwrap();

        let swapped = store
            .compare_and_swap("k", Some(&json!("stale")), Some(json!("x")))
            .await
            .unwrap();
        assert!(!swapped);
        assert_eq!(store.get("k").await.unwrap(), Some(json!("old")));

        let swapped = store
            .compare_and_swap("k", Some(&json!("old")), Some(json!("new")))
            .await
            .unwrap();
        assert!(swapped);
        assert_eq!(store.get("k").await.unwrap(), Some(json!("new")));

        let removed = store
            .compare_and_swap("k", Some(&json!("new")), None)
            .await
            .unwrap();
        assert!(removed);
        assert_eq!(store.get("k").await.unwrap(), None);
    }
}
