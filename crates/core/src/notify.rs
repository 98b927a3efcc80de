// crates/core/src/notify.rs
//! Change notifier: per-key job updates pushed from the store's change
//! stream to whichever observer is listening.
//!
//! Delivery is best effort. An observer that was not subscribed when a
//! write happened misses the notification but still finds the record via
//! `JobCache::read_job` on (re)attach.

use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

use crate::jobs::{summary_key, JobCache, JobEntry, JobView};

/// Fans store changes out to per-key handlers.
#[derive(Clone)]
pub struct ChangeNotifier {
    cache: JobCache,
}

impl ChangeNotifier {
    pub fn new(cache: JobCache) -> Self {
        Self { cache }
    }

    /// Invoke `handler` with the new view every time the record for `key`
    /// changes. A removed record is delivered as `JobView::Idle`.
    ///
    /// The store subscription is taken before this returns, so no write
    /// made after the call is missed. Dropping the [`Subscription`] stops
    /// delivery.
    pub fn subscribe<F>(&self, key: impl Into<String>, handler: F) -> Subscription
    where
        F: Fn(JobView) + Send + Sync + 'static,
    {
        let key = key.into();
        let store_key = summary_key(&key);
        let mut rx = self.cache.store().subscribe();
        let cache = self.cache.clone();
        let task_key = key.clone();

        let task = tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(change) if change.key == store_key => {
                        let view = match change.new_value {
                            None => JobView::Idle,
                            Some(raw) => match serde_json::from_value::<JobEntry>(raw) {
                                Ok(entry) => entry.into_view(),
                                Err(e) => {
                                    tracing::warn!(key = %task_key, error = %e, "skipping undecodable job record");
                                    continue;
                                }
                            },
                        };
                        handler(view);
                    }
                    Ok(_) => {}
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(key = %task_key, skipped, "change notifier lagged, re-reading job");
                        match cache.read_job(&task_key).await {
                            Ok(view) => handler(view),
                            Err(e) => {
                                tracing::warn!(key = %task_key, error = %e, "resync read failed")
                            }
                        }
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        });

        Subscription { key, task }
    }
}

/// Live interest in one key. Delivery stops when this is dropped.
pub struct Subscription {
    key: String,
    task: JoinHandle<()>,
}

impl Subscription {
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Stop delivery now.
    pub fn cancel(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, Store};
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::mpsc;

    fn setup() -> (JobCache, ChangeNotifier) {
        let cache = JobCache::new(Arc::new(MemoryStore::new()));
        let notifier = ChangeNotifier::new(cache.clone());
        (cache, notifier)
    }

    fn collect(notifier: &ChangeNotifier, key: &str) -> (Subscription, mpsc::UnboundedReceiver<JobView>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let sub = notifier.subscribe(key, move |view| {
            let _ = tx.send(view);
        });
        (sub, rx)
    }

    async fn next(rx: &mut mpsc::UnboundedReceiver<JobView>) -> JobView {
        tokio::time::timeout(Duration::from_millis(500), rx.recv())
            .await
            .expect("timeout waiting for notification")
            .expect("channel closed")
    }

    #[tokio::test]
    async fn test_delivers_lifecycle_in_order() {
        let (cache, notifier) = setup();
        let (_sub, mut rx) = collect(&notifier, "t1");

        let ticket = cache.begin_job("t1").await.unwrap();
        cache.complete_job(&ticket, "done!").await.unwrap();
        cache.clear_job("t1").await.unwrap();

        assert_eq!(next(&mut rx).await, JobView::Loading);
        assert_eq!(next(&mut rx).await, JobView::Done { summary: "done!".into() });
        assert_eq!(next(&mut rx).await, JobView::Idle);
    }

    #[tokio::test]
    async fn test_filters_other_keys() {
        let (cache, notifier) = setup();
        let (_sub, mut rx) = collect(&notifier, "mine");

        cache.begin_job("theirs").await.unwrap();
        let ticket = cache.begin_job("mine").await.unwrap();
        cache.fail_job(&ticket, "bad").await.unwrap();

        assert_eq!(next(&mut rx).await, JobView::Loading);
        assert_eq!(next(&mut rx).await, JobView::Error { error: "bad".into() });
    }

    #[tokio::test]
    async fn test_skips_undecodable_records() {
        let (cache, notifier) = setup();
        let (_sub, mut rx) = collect(&notifier, "k");

        cache.store().set("summary_k", json!({"status": "???"})).await.unwrap();
        cache.begin_job("k").await.unwrap();

        assert_eq!(next(&mut rx).await, JobView::Loading);
    }

    #[tokio::test]
    async fn test_dropped_subscription_stops_delivery() {
        let (cache, notifier) = setup();
        let (sub, mut rx) = collect(&notifier, "k");
        assert_eq!(sub.key(), "k");
        sub.cancel();

        cache.begin_job("k").await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_missed_write_is_still_readable() {
        let (cache, notifier) = setup();

        // Written with nobody listening.
        let ticket = cache.begin_job("k").await.unwrap();
        cache.complete_job(&ticket, "result").await.unwrap();

        let (_sub, mut rx) = collect(&notifier, "k");
        assert_eq!(
            cache.read_job("k").await.unwrap(),
            JobView::Done { summary: "result".into() }
        );
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(rx.try_recv().is_err());
    }
}
