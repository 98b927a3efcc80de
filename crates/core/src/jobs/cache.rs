// crates/core/src/jobs/cache.rs
//! Job cache over the shared store.
//!
//! Writes overwrite the whole record. `begin_job` is last-writer-wins; the
//! terminal writes are fenced by the ticket's `job_id` so a superseded
//! executor cannot clobber a newer job.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use uuid::Uuid;

use super::types::{summary_key, JobEntry, JobTicket, JobView};
use crate::error::StoreError;
use crate::store::Store;

/// Age after which a record is treated as absent.
pub const SUMMARY_TTL: Duration = Duration::from_secs(10 * 60);

/// Source of "now" in epoch milliseconds.
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> i64;
}

/// Wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// Per-key job records with TTL expiry. Cheap to clone; every clone shares
/// the same store.
#[derive(Clone)]
pub struct JobCache {
    store: Arc<dyn Store>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
}

impl JobCache {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            store,
            clock: Arc::new(SystemClock),
            ttl: SUMMARY_TTL,
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Overwrite whatever is stored for `key` with a fresh `loading` record.
    pub async fn begin_job(&self, key: &str) -> Result<JobTicket, StoreError> {
        let job_id = Uuid::new_v4().to_string();
        let entry = JobEntry::Loading {
            saved_at: self.clock.now_millis(),
            job_id: Some(job_id.clone()),
        };
        self.store
            .set(&summary_key(key), serde_json::to_value(&entry)?)
            .await?;
        tracing::debug!(key = %key, job_id = %job_id, "job started");
        Ok(JobTicket {
            key: key.to_string(),
            job_id,
        })
    }

    /// Record a successful result. Returns `false` if the job was superseded
    /// or cleared in the meantime; nothing is written in that case.
    pub async fn complete_job(&self, ticket: &JobTicket, summary: &str) -> Result<bool, StoreError> {
        let entry = JobEntry::Done {
            summary: summary.trim().to_string(),
            saved_at: self.clock.now_millis(),
            job_id: Some(ticket.job_id.clone()),
        };
        self.finish(ticket, entry).await
    }

    /// Record a failure. Same fencing as [`Self::complete_job`].
    pub async fn fail_job(&self, ticket: &JobTicket, message: &str) -> Result<bool, StoreError> {
        let entry = JobEntry::Error {
            error: message.to_string(),
            saved_at: self.clock.now_millis(),
            job_id: Some(ticket.job_id.clone()),
        };
        self.finish(ticket, entry).await
    }

    async fn finish(&self, ticket: &JobTicket, entry: JobEntry) -> Result<bool, StoreError> {
        let key = summary_key(&ticket.key);
        let current = self.store.get(&key).await?;

        let still_ours = current
            .as_ref()
            .and_then(|raw| serde_json::from_value::<JobEntry>(raw.clone()).ok())
            .is_some_and(|e| e.is_loading() && e.job_id() == Some(ticket.job_id.as_str()));
        if !still_ours {
            tracing::info!(
                key = %ticket.key,
                job_id = %ticket.job_id,
                "job superseded or cleared; dropping outcome"
            );
            return Ok(false);
        }

        let written = self
            .store
            .compare_and_swap(&key, current.as_ref(), Some(serde_json::to_value(&entry)?))
            .await?;
        if !written {
            tracing::info!(
                key = %ticket.key,
                job_id = %ticket.job_id,
                "job superseded during write; dropping outcome"
            );
        }
        Ok(written)
    }

    /// Current view for `key`. Expired or unreadable records read as `Idle`.
    pub async fn read_job(&self, key: &str) -> Result<JobView, StoreError> {
        Ok(self
            .read_entry(key)
            .await?
            .map_or(JobView::Idle, JobEntry::into_view))
    }

    /// Current record for `key`, or `None` when absent or expired.
    ///
    /// Expired records are deleted in the background, best effort.
    pub async fn read_entry(&self, key: &str) -> Result<Option<JobEntry>, StoreError> {
        let Some(raw) = self.store.get(&summary_key(key)).await? else {
            return Ok(None);
        };

        let entry = match serde_json::from_value::<JobEntry>(raw.clone()) {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "unreadable job record; discarding");
                self.evict(key, raw);
                return Ok(None);
            }
        };

        if self.is_expired(&entry) {
            tracing::debug!(key = %key, saved_at = entry.saved_at(), "job record expired");
            self.evict(key, raw);
            return Ok(None);
        }

        Ok(Some(entry))
    }

    /// Delete the record for `key`. Deleting an absent key succeeds.
    pub async fn clear_job(&self, key: &str) -> Result<(), StoreError> {
        self.store.delete(&summary_key(key)).await?;
        tracing::debug!(key = %key, "job cleared");
        Ok(())
    }

    /// Delete the record for `key` if it was last written before
    /// `cutoff_millis`. A record replaced in the meantime is left alone.
    pub async fn clear_job_written_before(
        &self,
        key: &str,
        cutoff_millis: i64,
    ) -> Result<bool, StoreError> {
        let store_key = summary_key(key);
        let Some(raw) = self.store.get(&store_key).await? else {
            return Ok(false);
        };
        let saved_at = serde_json::from_value::<JobEntry>(raw.clone())
            .map(|entry| entry.saved_at())
            .unwrap_or(0);
        if saved_at >= cutoff_millis {
            return Ok(false);
        }
        let cleared = self.store.compare_and_swap(&store_key, Some(&raw), None).await?;
        if cleared {
            tracing::debug!(key = %key, saved_at, "cleared job written before cutoff");
        }
        Ok(cleared)
    }

    pub fn now_millis(&self) -> i64 {
        self.clock.now_millis()
    }

    fn is_expired(&self, entry: &JobEntry) -> bool {
        let age = self.clock.now_millis() - entry.saved_at();
        age > self.ttl.as_millis() as i64
    }

    /// Remove `stale` unless something newer replaced it first.
    fn evict(&self, key: &str, stale: Value) {
        let store = Arc::clone(&self.store);
        let store_key = summary_key(key);
        tokio::spawn(async move {
            if let Err(e) = store.compare_and_swap(&store_key, Some(&stale), None).await {
                tracing::debug!(key = %store_key, error = %e, "failed to evict stale job record");
            }
        });
    }
}
