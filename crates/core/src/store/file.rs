// crates/core/src/store/file.rs
//! JSON-file-backed store.
//!
//! The whole map is kept in memory and written through on every mutation.
//! Writes go to a temp file in the target directory and are renamed over
//! the old file, so a crash never leaves a half-written store behind.

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::{broadcast, Mutex};

use super::{Entries, Store, StoreChange, CHANGE_CHANNEL_CAPACITY};
use crate::error::StoreError;

pub struct FileStore {
    path: PathBuf,
    entries: Mutex<Entries>,
    changes: broadcast::Sender<StoreChange>,
}

impl FileStore {
    /// Open the store at `path`. A missing file is an empty store.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let map = match tokio::fs::read(&path).await {
            Ok(bytes) if bytes.is_empty() => HashMap::new(),
            Ok(bytes) => serde_json::from_slice::<HashMap<String, Value>>(&bytes).map_err(
                |source| StoreError::Corrupt {
                    path: path.clone(),
                    source,
                },
            )?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(source) => return Err(StoreError::io(&path, source)),
        };

        tracing::debug!(path = %path.display(), keys = map.len(), "opened file store");

        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Ok(Self {
            path,
            entries: Mutex::new(Entries::from_map(map)),
            changes,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Apply `new_value` to a copy of the map, persist it, and only then
    /// make it visible. A failed write leaves the store unchanged.
    async fn commit(
        &self,
        entries: &mut Entries,
        key: &str,
        new_value: Option<Value>,
    ) -> Result<(), StoreError> {
        let mut next = entries.clone();
        let Some(change) = next.write(key, new_value) else {
            return Ok(());
        };

        let bytes = serde_json::to_vec_pretty(next.as_map())?;
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || write_atomic(&path, &bytes))
            .await
            .map_err(|e| StoreError::io(&self.path, std::io::Error::other(e)))??;

        *entries = next;
        let _ = self.changes.send(change);
        Ok(())
    }
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir).map_err(|e| StoreError::io(dir, e))?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|e| StoreError::io(dir, e))?;
    tmp.write_all(bytes).map_err(|e| StoreError::io(tmp.path(), e))?;
    tmp.as_file()
        .sync_all()
        .map_err(|e| StoreError::io(tmp.path(), e))?;
    tmp.persist(path)
        .map_err(|e| StoreError::io(path, e.error))?;
    Ok(())
}

#[async_trait]
impl Store for FileStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.entries.lock().await.get(key))
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().await;
        self.commit(&mut entries, key, Some(value)).await
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().await;
        self.commit(&mut entries, key, None).await
    }

    async fn compare_and_swap(
        &self,
        key: &str,
        expected: Option<&Value>,
        new: Option<Value>,
    ) -> Result<bool, StoreError> {
        let mut entries = self.entries.lock().await;
        if !entries.matches(key, expected) {
            return Ok(false);
        }
        self.commit(&mut entries, key, new).await?;
        Ok(true)
    }

    fn subscribe(&self) -> broadcast::Receiver<StoreChange> {
        self.changes.subscribe()
    }
}
