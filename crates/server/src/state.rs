// crates/server/src/state.rs
//! Application state for the Axum server.

use std::sync::Arc;
use std::time::Instant;

use tab_digest_core::bridge::{ContextBridge, PageWorkers};
use tab_digest_core::{
    ChangeNotifier, JobCache, LifecycleManager, Store, SummaryExecutor, SummaryService,
};

/// Shared application state accessible from all route handlers.
///
/// Every component is built over the same store, so a job begun through
/// one route is visible to every other route and stream.
pub struct AppState {
    /// Server start time for uptime tracking.
    pub start_time: Instant,
    /// The single persistent store (job records and settings).
    pub store: Arc<dyn Store>,
    pub cache: JobCache,
    pub notifier: ChangeNotifier,
    pub service: SummaryService,
    pub lifecycle: LifecycleManager,
    /// Page snapshots per context, answering scrape requests.
    pub pages: Arc<PageWorkers>,
}

impl AppState {
    /// Create a new application state wrapped in an Arc for sharing.
    pub fn new(store: Arc<dyn Store>) -> Arc<Self> {
        Self::with_cache(JobCache::new(Arc::clone(&store)))
    }

    /// Build state around a preconfigured cache (custom TTL or clock).
    pub fn with_cache(cache: JobCache) -> Arc<Self> {
        let pages = Arc::new(PageWorkers::new());
        let bridge = ContextBridge::new(pages.clone());
        let executor = SummaryExecutor::new(cache.clone());
        Arc::new(Self {
            start_time: Instant::now(),
            store: Arc::clone(cache.store()),
            notifier: ChangeNotifier::new(cache.clone()),
            service: SummaryService::new(cache.clone(), bridge, executor),
            lifecycle: LifecycleManager::new(cache.clone()),
            cache,
            pages,
        })
    }

    /// Get the server uptime in seconds.
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
