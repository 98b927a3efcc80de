// crates/core/src/llm/factory.rs
//! Provider factory - creates an LlmProvider from the current settings.

use std::sync::Arc;
use super::openai_compat::OpenAiCompatProvider;
use super::provider::LlmProvider;
use super::types::LlmError;
use crate::settings::Settings;

/// Create a provider for the configured endpoint.
///
/// Called once per job so settings changes apply to the next job without a
/// restart.
pub fn create_provider(settings: &Settings) -> Result<Arc<dyn LlmProvider>, LlmError> {
    let base = settings.normalized_base_url();
    if !(base.starts_with("http://") || base.starts_with("https://")) {
        return Err(LlmError::InvalidEndpoint(settings.base_url.clone()));
    }
    // `new` normalizes; hand it the raw value.
    Ok(Arc::new(OpenAiCompatProvider::new(
        &settings.base_url,
        &settings.model,
    )))
}
