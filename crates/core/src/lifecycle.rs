// crates/core/src/lifecycle.rs
//! Context lifecycle: drop a context's job record when the context goes
//! away or leaves the post it was summarizing.
//!
//! Cleanup is spawned and never awaited by the event source.

use std::collections::HashMap;
use std::sync::{Arc, LazyLock, Mutex};

use regex_lite::Regex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::jobs::JobCache;

/// Pages whose content can be summarized.
pub const POST_URL_PATTERN: &str = r"^https://www\.reddit\.com/r/[^/]+/comments/";

static POST_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(POST_URL_PATTERN).expect("POST_URL_PATTERN is a valid regex"));

/// True when `url` shows a summarizable post.
pub fn is_post_url(url: &str) -> bool {
    POST_URL.is_match(url)
}

/// Signals about a context, raised by whatever hosts the contexts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContextEvent {
    Destroyed { key: String },
    Navigated { key: String, url: String },
}

/// How a navigation relates to the post the context showed before.
enum Navigation {
    /// Same post reloaded.
    Stayed,
    /// Left for another page or another post.
    Left,
    /// First post this manager has seen for the context.
    FirstSeen,
}

#[derive(Clone)]
pub struct LifecycleManager {
    cache: JobCache,
    /// Last post URL seen per context.
    urls: Arc<Mutex<HashMap<String, String>>>,
    /// Records older than this were written before the manager existed,
    /// for a post it never saw.
    started_at: i64,
}

impl LifecycleManager {
    pub fn new(cache: JobCache) -> Self {
        Self {
            started_at: cache.now_millis(),
            cache,
            urls: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// React to `event`. Returns the cleanup task if one was started;
    /// callers are free to drop it.
    ///
    /// The record is cleared when the context is destroyed, when it
    /// navigates to a page that is not a post, or when it moves from one
    /// post to a different post. Reloading the same post keeps it.
    ///
    /// The first post seen for a context only drops a record left over
    /// from before this manager started (a restart), since nothing tells
    /// which post it described.
    pub fn handle(&self, event: ContextEvent) -> Option<JoinHandle<()>> {
        let cache = self.cache.clone();
        let key = match event {
            ContextEvent::Destroyed { key } => {
                self.forget(&key);
                key
            }
            ContextEvent::Navigated { key, url } => match self.navigate(&key, &url) {
                Navigation::Stayed => return None,
                Navigation::Left => key,
                Navigation::FirstSeen => {
                    let cutoff = self.started_at;
                    return Some(tokio::spawn(async move {
                        if let Err(e) = cache.clear_job_written_before(&key, cutoff).await {
                            tracing::warn!(key = %key, error = %e, "failed to clear leftover job");
                        }
                    }));
                }
            },
        };

        Some(tokio::spawn(async move {
            match cache.clear_job(&key).await {
                Ok(()) => tracing::debug!(key = %key, "cleared job for context"),
                Err(e) => tracing::warn!(key = %key, error = %e, "failed to clear job for context"),
            }
        }))
    }

    /// Drain events until every sender is gone.
    pub async fn run(self, mut events: mpsc::Receiver<ContextEvent>) {
        while let Some(event) = events.recv().await {
            self.handle(event);
        }
        tracing::debug!("context event stream closed");
    }

    fn navigate(&self, key: &str, url: &str) -> Navigation {
        let Ok(mut urls) = self.urls.lock() else {
            tracing::error!("Mutex poisoned tracking context urls");
            return Navigation::Left;
        };
        if !is_post_url(url) {
            urls.remove(key);
            return Navigation::Left;
        }
        match urls.insert(key.to_string(), url.to_string()) {
            Some(previous) if previous == url => Navigation::Stayed,
            Some(_) => Navigation::Left,
            None => Navigation::FirstSeen,
        }
    }

    fn forget(&self, key: &str) {
        match self.urls.lock() {
            Ok(mut urls) => {
                urls.remove(key);
            }
            Err(e) => tracing::error!("Mutex poisoned tracking context urls: {e}"),
        }
    }
}
