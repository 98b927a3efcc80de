// crates/core/src/bridge/mod.rs
//! Context bridge: deliver a request to the worker living inside a
//! context, installing the worker first if it is not there yet.

pub mod pages;
pub mod types;

pub use pages::{PageSnapshot, PageWorkers};
pub use types::{ContentRequest, ContentResponse};

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::BridgeError;

/// A per-context worker endpoint.
#[async_trait]
pub trait ContextWorker: Send + Sync {
    /// Deliver `request` to the worker in `context`. Fails with
    /// [`BridgeError::NoReceiver`] when no worker is installed there.
    async fn send(
        &self,
        context: &str,
        request: &ContentRequest,
    ) -> Result<ContentResponse, BridgeError>;

    /// Install the worker into `context`.
    async fn install(&self, context: &str) -> Result<(), BridgeError>;
}

/// Delivers requests with one install-and-retry on failure.
#[derive(Clone)]
pub struct ContextBridge {
    worker: Arc<dyn ContextWorker>,
}

impl ContextBridge {
    pub fn new(worker: Arc<dyn ContextWorker>) -> Self {
        Self { worker }
    }

    /// Send `request` to `context`.
    ///
    /// A context that predates the worker has nothing listening, so a
    /// failed first attempt installs the worker and resends exactly once.
    /// Never fails: a second failure comes back as an `ok: false` response.
    pub async fn deliver(&self, context: &str, request: &ContentRequest) -> ContentResponse {
        match self.worker.send(context, request).await {
            Ok(response) => return response,
            Err(e) => {
                tracing::debug!(context = %context, error = %e, "direct delivery failed; installing worker");
            }
        }

        let retry = async {
            self.worker.install(context).await?;
            self.worker.send(context, request).await
        };

        match retry.await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(context = %context, error = %e, "delivery failed after installing worker");
                ContentResponse::failure(format!("Could not inject content worker: {e}"))
            }
        }
    }
}
