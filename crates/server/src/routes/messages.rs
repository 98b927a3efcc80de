//! Inbound message endpoint.
//!
//! - POST /messages - `{action: "summarize", type: "post", text, key}`
//!
//! The ack never carries the summary; clients read `/jobs/{key}` or follow
//! `/jobs/{key}/stream`.

use std::sync::Arc;

use axum::{extract::State, routing::post, Json, Router};
use tab_digest_core::{SummarizeAck, SummarizeRequest};

use crate::error::ApiResult;
use crate::state::AppState;

/// POST /api/messages - start a summary job for `key`.
async fn post_message(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SummarizeRequest>,
) -> ApiResult<Json<SummarizeAck>> {
    tracing::debug!(key = %request.key, action = %request.action, "inbound message");
    let ack = state.service.handle(request).await?;
    Ok(Json(ack))
}

/// Build the messages router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/messages", post(post_message))
}
