// crates/core/src/bridge/types.rs
//! Messages exchanged with context workers.

use serde::{Deserialize, Serialize};

const SCRAPE_FAILED: &str = "Failed to scrape post content.";

/// Request sent to a context worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum ContentRequest {
    ScrapePost,
}

/// Worker reply: `{ok: true, title, body}` or `{ok: false, error}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentResponse {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ContentResponse {
    pub fn post(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            ok: true,
            title: Some(title.into()),
            body: Some(body.into()),
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            title: None,
            body: None,
            error: Some(error.into()),
        }
    }

    /// The text to summarize: non-empty title and body separated by a
    /// blank line. `Err` carries the failure message to record.
    pub fn into_text(self) -> Result<String, String> {
        if !self.ok {
            return Err(self.error.unwrap_or_else(|| SCRAPE_FAILED.to_string()));
        }
        let text = [self.title, self.body]
            .into_iter()
            .flatten()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n");
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_wire_shape() {
        let value = serde_json::to_value(ContentRequest::ScrapePost).unwrap();
        assert_eq!(value, json!({"action": "scrapePost"}));
    }

    #[test]
    fn test_response_wire_shape() {
        let value = serde_json::to_value(ContentResponse::failure("nope")).unwrap();
        assert_eq!(value, json!({"ok": false, "error": "nope"}));

        let parsed: ContentResponse =
            serde_json::from_value(json!({"ok": true, "title": "T", "body": ""})).unwrap();
        assert_eq!(parsed.into_text().unwrap(), "T");
    }

    #[test]
    fn test_into_text_joins_parts() {
        assert_eq!(
            ContentResponse::post("Title", "Body text").into_text().unwrap(),
            "Title\n\nBody text"
        );
        assert_eq!(ContentResponse::post("", "Only body").into_text().unwrap(), "Only body");
    }

    #[test]
    fn test_into_text_failure_message() {
        assert_eq!(ContentResponse::failure("boom").into_text().unwrap_err(), "boom");
        let bare = ContentResponse {
            ok: false,
            title: None,
            body: None,
            error: None,
        };
        assert_eq!(bare.into_text().unwrap_err(), SCRAPE_FAILED);
    }
}
