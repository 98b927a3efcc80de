// crates/core/src/store/mod.rs
//! Persistent key/value store shared by every component.
//!
//! The store is the single authoritative copy of all job records and
//! settings. Records are replaced as whole JSON values, never field by
//! field, and every successful mutation is published on a broadcast
//! change stream in write order.

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::broadcast;

use crate::error::StoreError;

/// Capacity of the change stream. Slow subscribers lag and must resync.
pub const CHANGE_CHANNEL_CAPACITY: usize = 256;

/// A single mutation observed on the store.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreChange {
    pub key: String,
    pub old_value: Option<Value>,
    /// `None` when the key was removed.
    pub new_value: Option<Value>,
}

/// Durable key/value storage with a subscribable change stream.
#[async_trait]
pub trait Store: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError>;

    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError>;

    /// Remove `key`. Removing an absent key succeeds without emitting a change.
    async fn delete(&self, key: &str) -> Result<(), StoreError>;

    /// Atomically replace the value under `key` when it still equals
    /// `expected` (`None` = absent). `new = None` removes the key.
    ///
    /// Returns `false` without writing when the current value differs.
    async fn compare_and_swap(
        &self,
        key: &str,
        expected: Option<&Value>,
        new: Option<Value>,
    ) -> Result<bool, StoreError>;

    /// Subscribe to every change made after this call returns.
    fn subscribe(&self) -> broadcast::Receiver<StoreChange>;
}

/// Plain map shared by the store implementations.
#[derive(Debug, Clone, Default)]
pub(crate) struct Entries(HashMap<String, Value>);

impl Entries {
    pub(crate) fn from_map(map: HashMap<String, Value>) -> Self {
        Self(map)
    }

    pub(crate) fn as_map(&self) -> &HashMap<String, Value> {
        &self.0
    }

    pub(crate) fn get(&self, key: &str) -> Option<Value> {
        self.0.get(key).cloned()
    }

    pub(crate) fn matches(&self, key: &str, expected: Option<&Value>) -> bool {
        self.0.get(key) == expected
    }

    /// Apply a write and describe it. Deleting an absent key is a no-op.
    pub(crate) fn write(&mut self, key: &str, new_value: Option<Value>) -> Option<StoreChange> {
        let old_value = match &new_value {
            Some(value) => self.0.insert(key.to_string(), value.clone()),
            None => self.0.remove(key),
        };
        if old_value.is_none() && new_value.is_none() {
            return None;
        }
        Some(StoreChange {
            key: key.to_string(),
            old_value,
            new_value,
        })
    }
}
