use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tab_digest_core::{FileStore, MemoryStore};
use tab_digest_server::{create_app, AppState};
use tower::ServiceExt;

const POST_URL: &str = "https://www.reddit.com/r/rust/comments/1abc/why_rust/";

/// Helper to make a request to the app.
async fn request(
    app: axum::Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);

    let body = if let Some(json) = body {
        builder = builder.header("content-type", "application/json");
        Body::from(serde_json::to_string(&json).unwrap())
    } else {
        Body::empty()
    };

    let response = app.oneshot(builder.body(body).unwrap()).await.unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

/// Poll a context's job until it leaves `loading`.
async fn wait_for_job(app: &axum::Router, key: &str) -> Value {
    for _ in 0..200 {
        let (_, view) = request(app.clone(), "GET", &format!("/api/jobs/{key}"), None).await;
        if view["status"] != "loading" {
            return view;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("job {key} never finished");
}

fn post_page() -> Value {
    json!({"url": POST_URL, "title": "Why Rust?", "body": "Because of the borrow checker."})
}

#[tokio::test]
async fn settings_round_trip() {
    let app = create_app(AppState::new(Arc::new(MemoryStore::new())));

    let (status, body) = request(
        app.clone(),
        "PUT",
        "/api/settings",
        Some(json!({"baseUrl": "http://127.0.0.1:9999/v1/", "model": "qwen", "maxTokens": 512})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["completionsUrl"], "http://127.0.0.1:9999/v1/chat/completions");

    let (_, body) = request(app, "GET", "/api/settings", None).await;
    assert_eq!(body["model"], "qwen");
    assert_eq!(body["maxTokens"], 512);
    assert_eq!(body["configured"], true);
}

#[tokio::test]
async fn summarize_end_to_end() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/v1/chat/completions")
        .with_status(200)
        .with_body(r#"{"choices":[{"message":{"content":"People like the borrow checker."}}]}"#)
        .create_async()
        .await;

    let app = create_app(AppState::new(Arc::new(MemoryStore::new())));
    // A trailing /v1 on the saved URL must not be doubled.
    request(
        app.clone(),
        "PUT",
        "/api/settings",
        Some(json!({"baseUrl": format!("{}/v1", server.url()), "model": "test"})),
    )
    .await;
    request(app.clone(), "PUT", "/api/contexts/7", Some(post_page())).await;

    let (status, ticket) = request(app.clone(), "POST", "/api/contexts/7/summarize", None).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(ticket["key"], "7");
    assert!(ticket["jobId"].is_string());

    let view = wait_for_job(&app, "7").await;
    assert_eq!(
        view,
        json!({"status": "done", "summary": "People like the borrow checker."})
    );
    mock.assert_async().await;
}

#[tokio::test]
async fn summarize_reports_server_error() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/v1/chat/completions")
        .with_status(500)
        .with_body("oom")
        .create_async()
        .await;

    let app = create_app(AppState::new(Arc::new(MemoryStore::new())));
    request(
        app.clone(),
        "PUT",
        "/api/settings",
        Some(json!({"baseUrl": server.url(), "model": "test"})),
    )
    .await;
    request(app.clone(), "PUT", "/api/contexts/3", Some(post_page())).await;
    request(app.clone(), "POST", "/api/contexts/3/summarize", None).await;

    let view = wait_for_job(&app, "3").await;
    assert_eq!(view, json!({"status": "error", "error": "LM Studio error 500: oom"}));
}

#[tokio::test]
async fn unconfigured_summarize_is_refused() {
    let app = create_app(AppState::new(Arc::new(MemoryStore::new())));
    request(app.clone(), "PUT", "/api/contexts/1", Some(post_page())).await;

    let (status, _) = request(app.clone(), "POST", "/api/contexts/1/summarize", None).await;
    assert_eq!(status, StatusCode::PRECONDITION_FAILED);

    let (_, view) = request(app, "GET", "/api/jobs/1", None).await;
    assert_eq!(view, json!({"status": "idle"}));
}

#[tokio::test]
async fn navigating_away_clears_job() {
    let state = AppState::new(Arc::new(MemoryStore::new()));
    let app = create_app(state.clone());
    request(app.clone(), "PUT", "/api/contexts/5", Some(post_page())).await;
    let ticket = state.cache.begin_job("5").await.unwrap();
    state.cache.complete_job(&ticket, "done").await.unwrap();

    // Reloading the same post keeps the summary.
    request(app.clone(), "PUT", "/api/contexts/5", Some(post_page())).await;
    tokio::time::sleep(Duration::from_millis(20)).await;
    let (_, view) = request(app.clone(), "GET", "/api/jobs/5", None).await;
    assert_eq!(view["status"], "done");

    request(
        app.clone(),
        "PUT",
        "/api/contexts/5",
        Some(json!({"url": "https://www.reddit.com/r/rust/", "title": "", "body": ""})),
    )
    .await;
    for _ in 0..50 {
        let (_, view) = request(app.clone(), "GET", "/api/jobs/5", None).await;
        if view["status"] == "idle" {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("job survived navigation away from the post");
}

#[tokio::test]
async fn non_summarize_message_is_refused() {
    let app = create_app(AppState::new(Arc::new(MemoryStore::new())));

    let (status, body) = request(
        app,
        "POST",
        "/api/messages",
        Some(json!({"action": "scrapePost", "type": "post", "text": "", "key": "1"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"ok": false}));
}

#[tokio::test]
async fn jobs_survive_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.json");

    {
        let store = FileStore::open(path.clone()).await.unwrap();
        let state = AppState::new(Arc::new(store));
        let ticket = state.cache.begin_job("9").await.unwrap();
        state.cache.complete_job(&ticket, "kept").await.unwrap();
    }

    let store = FileStore::open(path).await.unwrap();
    let app = create_app(AppState::new(Arc::new(store)));
    let (_, view) = request(app, "GET", "/api/jobs/9", None).await;
    assert_eq!(view, json!({"status": "done", "summary": "kept"}));
}
