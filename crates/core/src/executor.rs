// crates/core/src/executor.rs
//! Job executor: one summarization per invocation, outcome written to the
//! job cache.
//!
//! `run` returns nothing. Observers learn the result only through the
//! cache, so the job outlives whichever observer started it.

use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::jobs::{JobCache, JobTicket};
use crate::llm::{create_provider, CompletionRequest, LlmError, LlmProvider};
use crate::settings::Settings;

pub const SYSTEM_PROMPT: &str = "You are a concise assistant. Summarize the following Reddit post clearly and briefly. \
Cover the main topic, key points, and any important context.";

pub const TEMPERATURE: f32 = 0.3;

/// Builds a provider from the settings current at invocation time.
pub type ProviderFactory =
    Arc<dyn Fn(&Settings) -> Result<Arc<dyn LlmProvider>, LlmError> + Send + Sync>;

#[derive(Clone)]
pub struct SummaryExecutor {
    cache: JobCache,
    provider_factory: ProviderFactory,
}

impl SummaryExecutor {
    pub fn new(cache: JobCache) -> Self {
        Self {
            cache,
            provider_factory: Arc::new(create_provider),
        }
    }

    pub fn with_provider_factory(mut self, factory: ProviderFactory) -> Self {
        self.provider_factory = factory;
        self
    }

    /// Run the job on its own task.
    pub fn spawn(&self, ticket: JobTicket, text: String) -> JoinHandle<()> {
        let executor = self.clone();
        tokio::spawn(async move { executor.run(ticket, text).await })
    }

    /// Summarize `text` and record `done` or `error` under the ticket.
    pub async fn run(&self, ticket: JobTicket, text: String) {
        let recorded = match self.summarize(&text).await {
            Ok(summary) => self.cache.complete_job(&ticket, &summary).await,
            Err(e) => {
                tracing::warn!(key = %ticket.key, job_id = %ticket.job_id, error = %e, "summarization failed");
                self.cache.fail_job(&ticket, &e.to_string()).await
            }
        };

        match recorded {
            Ok(true) => tracing::info!(key = %ticket.key, job_id = %ticket.job_id, "job finished"),
            Ok(false) => {}
            Err(e) => {
                tracing::error!(key = %ticket.key, job_id = %ticket.job_id, error = %e, "could not record job outcome")
            }
        }
    }

    async fn summarize(&self, text: &str) -> Result<String, LlmError> {
        let settings = Settings::load(self.cache.store().as_ref())
            .await
            .map_err(|e| LlmError::Settings(e.to_string()))?;
        let provider = (self.provider_factory)(&settings)?;

        tracing::info!(
            provider = provider.name(),
            model = provider.model(),
            chars = text.len(),
            "requesting summary"
        );

        let response = provider
            .complete(CompletionRequest {
                system_prompt: Some(SYSTEM_PROMPT.to_string()),
                user_prompt: text.to_string(),
                max_tokens: settings.max_tokens,
                temperature: TEMPERATURE,
            })
            .await?;
        Ok(response.content)
    }
}
