//! API routes for per-context summary jobs.
//!
//! - GET    /jobs/{key} - current job view (expired records read as idle)
//! - DELETE /jobs/{key} - drop the record
//! - GET    /jobs/{key}/stream - SSE: current view, then every change

use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::routing::get;
use axum::{Json, Router};
use tab_digest_core::JobView;
use tokio::sync::mpsc;

use crate::error::ApiResult;
use crate::state::AppState;

/// GET /api/jobs/{key} - current view for a context.
async fn get_job(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
) -> ApiResult<Json<JobView>> {
    Ok(Json(state.cache.read_job(&key).await?))
}

/// DELETE /api/jobs/{key} - clear a context's record. Idempotent.
async fn clear_job(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
) -> ApiResult<StatusCode> {
    state.cache.clear_job(&key).await?;
    Ok(StatusCode::NO_CONTENT)
}

fn job_event(view: &JobView) -> Event {
    let json = serde_json::to_string(view).unwrap_or_default();
    Event::default().event("job").data(json)
}

/// GET /api/jobs/{key}/stream - SSE stream of job views.
///
/// Subscribes before reading, so a write landing between the two shows up
/// as a follow-up event rather than being lost.
async fn stream_job(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
) -> ApiResult<Sse<impl tokio_stream::Stream<Item = Result<Event, Infallible>>>> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let subscription = state.notifier.subscribe(key.clone(), move |view| {
        let _ = tx.send(view);
    });
    let initial = state.cache.read_job(&key).await?;

    let stream = async_stream::stream! {
        // Dropped with the stream when the client disconnects.
        let _subscription = subscription;
        yield Ok(job_event(&initial));
        while let Some(view) = rx.recv().await {
            yield Ok(job_event(&view));
        }
    };

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

/// Build the jobs router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/jobs/{key}", get(get_job).delete(clear_job))
        .route("/jobs/{key}/stream", get(stream_job))
}
