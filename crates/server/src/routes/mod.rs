//! API route handlers for the tab-digest server.

pub mod contexts;
pub mod health;
pub mod jobs;
pub mod messages;
pub mod settings;

use std::sync::Arc;

use axum::Router;

use crate::state::AppState;

/// Create the combined API router with all routes under /api prefix.
///
/// Routes:
/// - GET    /api/health - Health check
/// - POST   /api/messages - Inbound `summarize` message, acked with `{ok}`
/// - GET    /api/jobs/{key} - Current job view for a context
/// - DELETE /api/jobs/{key} - Drop a context's job record
/// - GET    /api/jobs/{key}/stream - SSE stream of job views for a context
/// - GET    /api/settings - Read endpoint settings
/// - PUT    /api/settings - Update endpoint settings (partial)
/// - PUT    /api/contexts/{key} - Open or navigate a context
/// - DELETE /api/contexts/{key} - Destroy a context
/// - POST   /api/contexts/{key}/summarize - Summarize what a context shows
pub fn api_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .nest("/api", health::router())
        .nest("/api", messages::router())
        .nest("/api", jobs::router())
        .nest("/api", settings::router())
        .nest("/api", contexts::router())
        .with_state(state)
}
