// crates/core/src/jobs/types.rs
//! Types for the job cache.

use serde::{Deserialize, Serialize};

/// Store key prefix for job records.
pub const SUMMARY_KEY_PREFIX: &str = "summary_";

/// Store key holding the job record for a context.
pub fn summary_key(key: &str) -> String {
    format!("{SUMMARY_KEY_PREFIX}{key}")
}

/// Persisted job record. At most one exists per context key.
///
/// `job_id` is the nonce written by `begin_job`; terminal writes carry it
/// forward so a superseded executor can tell its job is gone. Records
/// written without `jobId` or `savedAt` still decode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum JobEntry {
    #[serde(rename_all = "camelCase")]
    Loading {
        #[serde(default)]
        saved_at: i64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        job_id: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    Done {
        summary: String,
        #[serde(default)]
        saved_at: i64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        job_id: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    Error {
        error: String,
        #[serde(default)]
        saved_at: i64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        job_id: Option<String>,
    },
}

impl JobEntry {
    /// Epoch millis of the last write.
    pub fn saved_at(&self) -> i64 {
        match self {
            Self::Loading { saved_at, .. }
            | Self::Done { saved_at, .. }
            | Self::Error { saved_at, .. } => *saved_at,
        }
    }

    pub fn job_id(&self) -> Option<&str> {
        match self {
            Self::Loading { job_id, .. } | Self::Done { job_id, .. } | Self::Error { job_id, .. } => {
                job_id.as_deref()
            }
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading { .. })
    }

    pub fn into_view(self) -> JobView {
        match self {
            Self::Loading { .. } => JobView::Loading,
            Self::Done { summary, .. } => JobView::Done { summary },
            Self::Error { error, .. } => JobView::Error { error },
        }
    }
}

/// Observer-facing state for a key. An absent or expired record is `Idle`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum JobView {
    Idle,
    Loading,
    Done { summary: String },
    Error { error: String },
}

impl JobView {
    /// A job is in flight; observers should not offer to start another.
    pub fn is_busy(&self) -> bool {
        matches!(self, Self::Loading)
    }
}

/// Handle returned by `begin_job`. Terminal writes only land while the
/// stored record still carries this ticket's `job_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobTicket {
    pub key: String,
    pub job_id: String,
}
