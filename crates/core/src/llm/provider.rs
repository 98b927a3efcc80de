// crates/core/src/llm/provider.rs
//! LlmProvider trait defining the interface for inference endpoints.

use async_trait::async_trait;
use super::types::{CompletionRequest, CompletionResponse, LlmError};

/// Trait for inference endpoints that can run a chat completion.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Run a completion with system + user prompt.
    ///
    /// An empty or missing completion is `LlmError::EmptyResult`, never an
    /// `Ok` with blank content.
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError>;

    /// Provider name for logging (e.g. "openai-compat").
    fn name(&self) -> &str;

    /// Model identifier sent to the endpoint.
    fn model(&self) -> &str;
}
