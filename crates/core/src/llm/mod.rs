// crates/core/src/llm/mod.rs
//! Inference endpoint integration for summarization.
//!
//! Provides the `LlmProvider` trait and an OpenAI-compatible HTTP
//! implementation (LM Studio, llama.cpp server, and friends).

pub mod factory;
pub mod openai_compat;
pub mod provider;
pub mod types;

pub use factory::create_provider;
pub use openai_compat::OpenAiCompatProvider;
pub use provider::LlmProvider;
pub use types::{CompletionRequest, CompletionResponse, LlmError};
