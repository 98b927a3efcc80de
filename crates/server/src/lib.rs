// crates/server/src/lib.rs
//! Tab-digest server library.
//!
//! Serves the summary job cache over HTTP: hosts report contexts opening,
//! navigating and closing, request summaries, and follow job state through
//! polling or an SSE stream.

pub mod error;
pub mod routes;
pub mod state;

pub use error::*;
pub use routes::api_routes;
pub use state::AppState;

use std::sync::Arc;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Create the Axum application with all routes and middleware.
///
/// This sets up:
/// - API routes (health, messages, jobs, settings, contexts)
/// - CORS (allows any origin, the server only binds to loopback)
/// - Request tracing
pub fn create_app(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(api_routes(state))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
