//! Context routes: hosts report pages opening, navigating and closing here,
//! and ask for a summary of what a context currently shows.
//!
//! - PUT    /contexts/{key}           - page loaded or navigated
//! - DELETE /contexts/{key}           - context destroyed
//! - POST   /contexts/{key}/summarize - start a summary job

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{post, put};
use axum::{Json, Router};
use serde::Serialize;
use tab_digest_core::bridge::PageSnapshot;
use tab_digest_core::lifecycle::is_post_url;
use tab_digest_core::{ContextEvent, JobTicket};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextResponse {
    pub key: String,
    pub url: String,
    pub is_post: bool,
}

/// PUT /api/contexts/{key} - replace the page a context shows.
async fn load_context(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
    Json(page): Json<PageSnapshot>,
) -> Json<ContextResponse> {
    let url = page.url.clone();
    state.pages.load(&key, page);
    state.lifecycle.handle(ContextEvent::Navigated {
        key: key.clone(),
        url: url.clone(),
    });
    tracing::debug!(key = %key, url = %url, "context loaded");

    Json(ContextResponse {
        is_post: is_post_url(&url),
        key,
        url,
    })
}

/// DELETE /api/contexts/{key} - the context is gone.
async fn destroy_context(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
) -> StatusCode {
    state.pages.close(&key);
    state.lifecycle.handle(ContextEvent::Destroyed { key });
    StatusCode::NO_CONTENT
}

/// POST /api/contexts/{key}/summarize - scrape the context and start a job.
///
/// Answers 202 with the job ticket; progress is read from `/api/jobs/{key}`.
async fn summarize_context(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
) -> ApiResult<(StatusCode, Json<JobTicket>)> {
    let page = state
        .pages
        .page(&key)
        .ok_or_else(|| ApiError::ContextNotFound(key.clone()))?;
    if !is_post_url(&page.url) {
        return Err(ApiError::BadRequest(
            "Open a Reddit post to summarize it.".to_string(),
        ));
    }

    let ticket = state.service.summarize_context(&key).await?;
    Ok((StatusCode::ACCEPTED, Json(ticket)))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/contexts/{key}", put(load_context).delete(destroy_context))
        .route("/contexts/{key}/summarize", post(summarize_context))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use std::time::Duration;
    use tab_digest_core::{JobView, MemoryStore};
    use tower::ServiceExt;

    const POST: &str = "https://www.reddit.com/r/rust/comments/abc/title/";

    fn app(state: Arc<AppState>) -> Router {
        Router::new().nest("/api", router()).with_state(state)
    }

    async fn send(app: Router, method: &str, uri: &str, body: Option<serde_json::Value>) -> (StatusCode, serde_json::Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                builder = builder.header("content-type", "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        let resp = app.oneshot(builder.body(body).unwrap()).await.unwrap();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    fn page(url: &str) -> serde_json::Value {
        serde_json::json!({"url": url, "title": "Title", "body": "Body"})
    }

    #[tokio::test]
    async fn test_load_reports_post_status() {
        let state = AppState::new(Arc::new(MemoryStore::new()));
        let (status, body) = send(app(state.clone()), "PUT", "/api/contexts/1", Some(page(POST))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["isPost"], true);
        assert!(state.pages.page("1").is_some());

        let (_, body) = send(app(state), "PUT", "/api/contexts/1", Some(page("https://example.com/"))).await;
        assert_eq!(body["isPost"], false);
    }

    #[tokio::test]
    async fn test_summarize_unknown_context_is_404() {
        let state = AppState::new(Arc::new(MemoryStore::new()));
        let (status, _) = send(app(state), "POST", "/api/contexts/9/summarize", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_summarize_non_post_is_400() {
        let state = AppState::new(Arc::new(MemoryStore::new()));
        send(app(state.clone()), "PUT", "/api/contexts/1", Some(page("https://example.com/"))).await;
        let (status, _) = send(app(state), "POST", "/api/contexts/1/summarize", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_summarize_unconfigured_is_412() {
        let state = AppState::new(Arc::new(MemoryStore::new()));
        send(app(state.clone()), "PUT", "/api/contexts/1", Some(page(POST))).await;
        let (status, body) = send(app(state.clone()), "POST", "/api/contexts/1/summarize", None).await;
        assert_eq!(status, StatusCode::PRECONDITION_FAILED);
        assert_eq!(body["details"], "Please set your LM Studio URL and model first.");
        assert_eq!(state.cache.read_job("1").await.unwrap(), JobView::Idle);
    }

    #[tokio::test]
    async fn test_destroy_clears_job() {
        let state = AppState::new(Arc::new(MemoryStore::new()));
        send(app(state.clone()), "PUT", "/api/contexts/1", Some(page(POST))).await;
        state.cache.begin_job("1").await.unwrap();

        let (status, _) = send(app(state.clone()), "DELETE", "/api/contexts/1", None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert!(state.pages.page("1").is_none());

        for _ in 0..50 {
            if state.cache.read_job("1").await.unwrap() == JobView::Idle {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("job record survived context destruction");
    }
}
