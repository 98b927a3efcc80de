// crates/core/src/llm/types.rs
//! Request/response/error types for inference calls.

use thiserror::Error;

/// Request for a chat completion.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub system_prompt: Option<String>,
    pub user_prompt: String,
    /// `-1` leaves the length to the server.
    pub max_tokens: i64,
    pub temperature: f32,
}

/// Successful completion.
#[derive(Debug, Clone)]
pub struct CompletionResponse {
    /// Trimmed, never empty.
    pub content: String,
    pub model: Option<String>,
    pub latency_ms: u64,
}

/// Errors that can occur during an inference call.
///
/// The `Display` text is what ends up in a failed job record, so each
/// variant reads as a user-facing message.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Could not reach LM Studio at {url}: {reason}")]
    Unreachable { url: String, reason: String },

    #[error("LM Studio error {status}: {body}")]
    Status { status: u16, body: String },

    #[error("No summary returned from the model.")]
    EmptyResult,

    #[error("Failed to parse response: {0}")]
    ParseFailed(String),

    #[error("Invalid endpoint URL: {0}")]
    InvalidEndpoint(String),

    #[error("Could not read settings: {0}")]
    Settings(String),
}
