// crates/core/src/bridge/pages.rs
//! In-process context workers backed by page snapshots.
//!
//! Each context holds the page it currently shows. A worker has to be
//! installed into the page before it answers; loading a new page drops it,
//! just like a freshly navigated tab has no content worker yet.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::types::{ContentRequest, ContentResponse};
use super::ContextWorker;
use crate::error::BridgeError;

const NO_POST_CONTENT: &str =
    "Could not find post content. Make sure you are on a Reddit post page.";

/// What a context is showing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageSnapshot {
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body: String,
}

struct PageState {
    snapshot: PageSnapshot,
    worker_installed: bool,
}

#[derive(Default)]
pub struct PageWorkers {
    pages: RwLock<HashMap<String, PageState>>,
}

impl PageWorkers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Show `snapshot` in `context`, replacing any previous page and its
    /// installed worker.
    pub fn load(&self, context: &str, snapshot: PageSnapshot) {
        match self.pages.write() {
            Ok(mut pages) => {
                pages.insert(
                    context.to_string(),
                    PageState {
                        snapshot,
                        worker_installed: false,
                    },
                );
            }
            Err(e) => tracing::error!("RwLock poisoned writing pages: {e}"),
        }
    }

    /// Forget `context` entirely.
    pub fn close(&self, context: &str) {
        match self.pages.write() {
            Ok(mut pages) => {
                pages.remove(context);
            }
            Err(e) => tracing::error!("RwLock poisoned removing page: {e}"),
        }
    }

    pub fn page(&self, context: &str) -> Option<PageSnapshot> {
        match self.pages.read() {
            Ok(pages) => pages.get(context).map(|p| p.snapshot.clone()),
            Err(e) => {
                tracing::error!("RwLock poisoned reading pages: {e}");
                None
            }
        }
    }

    pub fn has_worker(&self, context: &str) -> bool {
        match self.pages.read() {
            Ok(pages) => pages.get(context).is_some_and(|p| p.worker_installed),
            Err(_) => false,
        }
    }
}

fn scrape(snapshot: &PageSnapshot) -> ContentResponse {
    let title = snapshot.title.trim();
    let body = snapshot.body.trim();
    if title.is_empty() && body.is_empty() {
        return ContentResponse::failure(NO_POST_CONTENT);
    }
    ContentResponse::post(title, body)
}

#[async_trait]
impl ContextWorker for PageWorkers {
    async fn send(
        &self,
        context: &str,
        request: &ContentRequest,
    ) -> Result<ContentResponse, BridgeError> {
        let pages = self
            .pages
            .read()
            .map_err(|e| BridgeError::Unavailable(e.to_string()))?;
        let page = pages
            .get(context)
            .filter(|p| p.worker_installed)
            .ok_or(BridgeError::NoReceiver)?;

        Ok(match request {
            ContentRequest::ScrapePost => scrape(&page.snapshot),
        })
    }

    async fn install(&self, context: &str) -> Result<(), BridgeError> {
        let mut pages = self
            .pages
            .write()
            .map_err(|e| BridgeError::Unavailable(e.to_string()))?;
        let page = pages
            .get_mut(context)
            .ok_or_else(|| BridgeError::UnknownContext(context.to_string()))?;
        page.worker_installed = true;
        tracing::debug!(context = %context, "content worker installed");
        Ok(())
    }
}
