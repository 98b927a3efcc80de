// crates/core/src/service.rs
//! Entry points that start summary jobs.
//!
//! `handle` serves the inbound `summarize` message; `summarize_context`
//! runs the whole observer-side flow (settings check, scrape through the
//! bridge, executor) for a context.

use serde::{Deserialize, Serialize};

use crate::bridge::{ContentRequest, ContextBridge};
use crate::error::{RequestError, StoreError};
use crate::executor::SummaryExecutor;
use crate::jobs::{JobCache, JobTicket};
use crate::settings::Settings;

pub const SUMMARIZE_ACTION: &str = "summarize";
pub const POST_KIND: &str = "post";

/// `{action: "summarize", type: "post", text, key}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummarizeRequest {
    pub action: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub text: String,
    pub key: String,
}

impl SummarizeRequest {
    pub fn post(key: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            action: SUMMARIZE_ACTION.to_string(),
            kind: POST_KIND.to_string(),
            text: text.into(),
            key: key.into(),
        }
    }
}

/// Acknowledgement only. The result is read from the job cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummarizeAck {
    pub ok: bool,
}

#[derive(Clone)]
pub struct SummaryService {
    cache: JobCache,
    bridge: ContextBridge,
    executor: SummaryExecutor,
}

impl SummaryService {
    pub fn new(cache: JobCache, bridge: ContextBridge, executor: SummaryExecutor) -> Self {
        Self {
            cache,
            bridge,
            executor,
        }
    }

    pub fn cache(&self) -> &JobCache {
        &self.cache
    }

    /// Start a job for an inbound message. Messages that are not a post
    /// summary request are acked with `ok: false` and touch nothing.
    pub async fn handle(&self, request: SummarizeRequest) -> Result<SummarizeAck, StoreError> {
        if request.action != SUMMARIZE_ACTION || request.kind != POST_KIND {
            tracing::debug!(action = %request.action, kind = %request.kind, "ignoring message");
            return Ok(SummarizeAck { ok: false });
        }

        let ticket = self.cache.begin_job(&request.key).await?;
        self.executor.spawn(ticket, request.text);
        Ok(SummarizeAck { ok: true })
    }

    /// Summarize whatever `key`'s context is showing.
    ///
    /// Refuses with [`RequestError::NotConfigured`] before touching the
    /// cache when no settings were ever saved. Otherwise the job is begun
    /// first, so observers see `loading` while the page is scraped; a
    /// scrape failure ends the job in `error` right here.
    pub async fn summarize_context(&self, key: &str) -> Result<JobTicket, RequestError> {
        if !Settings::is_configured(self.cache.store().as_ref()).await? {
            return Err(RequestError::NotConfigured);
        }

        let ticket = self.cache.begin_job(key).await?;

        let scraped = self.bridge.deliver(key, &ContentRequest::ScrapePost).await;
        match scraped.into_text() {
            Ok(text) => {
                self.executor.spawn(ticket.clone(), text);
            }
            Err(message) => {
                tracing::info!(key = %key, error = %message, "scrape failed");
                self.cache.fail_job(&ticket, &message).await?;
            }
        }
        Ok(ticket)
    }
}
