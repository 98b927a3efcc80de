// crates/core/src/settings.rs
//! Inference endpoint settings, persisted in the shared store.
//!
//! Settings are re-read on every job; nothing here is cached.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::StoreError;
use crate::store::Store;

pub const DEFAULT_BASE_URL: &str = "http://localhost:1234";
pub const DEFAULT_MODEL: &str = "local-model";
pub const DEFAULT_MAX_TOKENS: i64 = 300;

const BASE_URL_KEY: &str = "lmBaseUrl";
const MODEL_KEY: &str = "lmModel";
const MAX_TOKENS_KEY: &str = "lmMaxTokens";

/// API path appended to the normalized base URL.
const COMPLETIONS_PATH: &str = "/v1/chat/completions";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// As entered by the user; see [`Settings::normalized_base_url`].
    pub base_url: String,
    pub model: String,
    /// `-1` for unbounded.
    pub max_tokens: i64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }
}

impl Settings {
    /// Read settings, filling anything unset with defaults.
    pub async fn load(store: &dyn Store) -> Result<Self, StoreError> {
        let defaults = Self::default();
        let base_url = read_string(store, BASE_URL_KEY).await?.unwrap_or(defaults.base_url);
        let model = read_string(store, MODEL_KEY).await?.unwrap_or(defaults.model);
        let max_tokens = store
            .get(MAX_TOKENS_KEY)
            .await?
            .and_then(|v| v.as_i64())
            .unwrap_or(defaults.max_tokens);
        Ok(Self {
            base_url,
            model,
            max_tokens,
        })
    }

    /// True once the user has saved an endpoint or a model.
    pub async fn is_configured(store: &dyn Store) -> Result<bool, StoreError> {
        Ok(read_string(store, BASE_URL_KEY).await?.is_some()
            || read_string(store, MODEL_KEY).await?.is_some())
    }

    /// Persist these settings. Blank fields fall back to defaults.
    /// Returns what was stored.
    pub async fn save(&self, store: &dyn Store) -> Result<Self, StoreError> {
        let defaults = Self::default();
        let saved = Self {
            base_url: non_blank(&self.base_url).unwrap_or(defaults.base_url),
            model: non_blank(&self.model).unwrap_or(defaults.model),
            max_tokens: self.max_tokens,
        };
        store.set(BASE_URL_KEY, Value::from(saved.base_url.clone())).await?;
        store.set(MODEL_KEY, Value::from(saved.model.clone())).await?;
        store.set(MAX_TOKENS_KEY, Value::from(saved.max_tokens)).await?;
        tracing::info!(base_url = %saved.base_url, model = %saved.model, "settings saved");
        Ok(saved)
    }

    pub fn normalized_base_url(&self) -> String {
        normalize_base_url(&self.base_url)
    }

    pub fn completions_url(&self) -> String {
        completions_url(&self.normalized_base_url())
    }
}

/// Strip trailing slashes and a trailing `/v1`, so both
/// `http://host:1234` and `http://host:1234/v1/` name the same server.
pub fn normalize_base_url(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    trimmed.strip_suffix("/v1").unwrap_or(trimmed).to_string()
}

/// Chat completions endpoint under an already-normalized base URL.
pub fn completions_url(normalized_base: &str) -> String {
    format!("{normalized_base}{COMPLETIONS_PATH}")
}

fn non_blank(s: &str) -> Option<String> {
    let s = s.trim();
    (!s.is_empty()).then(|| s.to_string())
}

async fn read_string(store: &dyn Store, key: &str) -> Result<Option<String>, StoreError> {
    Ok(store
        .get(key)
        .await?
        .as_ref()
        .and_then(Value::as_str)
        .and_then(non_blank))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_normalize_base_url() {
        assert_eq!(normalize_base_url("http://localhost:1234"), "http://localhost:1234");
        assert_eq!(normalize_base_url("http://localhost:1234/"), "http://localhost:1234");
        assert_eq!(normalize_base_url("http://localhost:1234/v1"), "http://localhost:1234");
        assert_eq!(normalize_base_url("http://localhost:1234/v1/"), "http://localhost:1234");
        assert_eq!(normalize_base_url(" http://host/api/v1 "), "http://host/api");
        // Only the version suffix is stripped.
        assert_eq!(normalize_base_url("http://host/v10"), "http://host/v10");
    }

    #[test]
    fn test_completions_url_collapses_v1() {
        let settings = Settings {
            base_url: "http://localhost:1234/v1".into(),
            ..Settings::default()
        };
        assert_eq!(settings.completions_url(), "http://localhost:1234/v1/chat/completions");
    }

    #[tokio::test]
    async fn test_load_defaults() {
        let store = MemoryStore::new();
        assert_eq!(Settings::load(&store).await.unwrap(), Settings::default());
        assert!(!Settings::is_configured(&store).await.unwrap());
    }

    #[tokio::test]
    async fn test_load_reads_original_keys() {
        let store = MemoryStore::new();
        store.set("lmBaseUrl", json!("http://gpu-box:8080/v1")).await.unwrap();
        store.set("lmModel", json!("")).await.unwrap();

        let settings = Settings::load(&store).await.unwrap();
        assert_eq!(settings.base_url, "http://gpu-box:8080/v1");
        assert_eq!(settings.model, DEFAULT_MODEL);
        assert_eq!(settings.max_tokens, DEFAULT_MAX_TOKENS);
        assert!(Settings::is_configured(&store).await.unwrap());
    }

    #[tokio::test]
    async fn test_model_alone_counts_as_configured() {
        let store = MemoryStore::new();
        store.set("lmModel", json!("qwen")).await.unwrap();
        assert!(Settings::is_configured(&store).await.unwrap());
    }

    #[tokio::test]
    async fn test_save_fills_blanks() {
        let store = MemoryStore::new();
        let saved = Settings {
            base_url: "  ".into(),
            model: "mistral".into(),
            max_tokens: -1,
        }
        .save(&store)
        .await
        .unwrap();

        assert_eq!(saved.base_url, DEFAULT_BASE_URL);
        assert_eq!(Settings::load(&store).await.unwrap(), saved);
        assert_eq!(store.get("lmMaxTokens").await.unwrap(), Some(json!(-1)));
    }
}
