use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by a [`crate::store::Store`].
///
/// These are environment failures (disk, poisoned locks), not domain
/// outcomes. Job failures are recorded in the job cache instead.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error on store file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Store file {path} is not valid JSON: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to encode record: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Store lock poisoned")]
    Poisoned,
}

impl StoreError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Errors from delivering a message to a per-context worker.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("Could not establish connection. Receiving end does not exist.")]
    NoReceiver,

    #[error("No context with id: {0}")]
    UnknownContext(String),

    #[error("Worker registry unavailable: {0}")]
    Unavailable(String),
}

/// Reasons a summary request is refused before any job starts.
#[derive(Debug, Error)]
pub enum RequestError {
    #[error("Please set your LM Studio URL and model first.")]
    NotConfigured,

    #[error("No post page is attached")]
    NotAttached,

    #[error("A summary is already in progress")]
    Busy,

    #[error(transparent)]
    Store(#[from] StoreError),
}
