// crates/server/src/main.rs
//! Tab-digest server binary.
//!
//! Opens the persistent store, then serves the API on loopback until
//! Ctrl-C.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tab_digest_core::FileStore;
use tab_digest_server::{create_app, AppState};
use tracing_subscriber::EnvFilter;

/// Default port for the server.
const DEFAULT_PORT: u16 = 47893;

/// Get the server port from environment or use default.
fn get_port() -> u16 {
    std::env::var("TAB_DIGEST_PORT")
        .ok()
        .or_else(|| std::env::var("PORT").ok())
        .and_then(|p| p.parse().ok())
        .unwrap_or(DEFAULT_PORT)
}

/// Where the store lives.
///
/// Priority:
/// 1. TAB_DIGEST_DATA environment variable (explicit override)
/// 2. `<platform data dir>/tab-digest/store.json`
fn get_store_path() -> Result<PathBuf> {
    if let Ok(path) = std::env::var("TAB_DIGEST_DATA") {
        return Ok(PathBuf::from(path));
    }
    let data_dir = dirs::data_dir().context("Could not determine data directory")?;
    Ok(data_dir.join("tab-digest").join("store.json"))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn,tab_digest=info".into()),
        )
        .init();

    eprintln!("\ntab-digest v{}\n", env!("CARGO_PKG_VERSION"));

    let store_path = get_store_path()?;
    if let Some(parent) = store_path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    let store = FileStore::open(store_path.clone())
        .await
        .with_context(|| format!("opening store at {}", store_path.display()))?;
    tracing::info!(path = %store_path.display(), "store opened");

    let state = AppState::new(Arc::new(store));
    let app = create_app(state);

    let port = get_port();
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    eprintln!("  Ready at http://{addr}\n");
    tracing::info!("listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}
