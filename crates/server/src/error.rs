// crates/server/src/error.rs
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tab_digest_core::{RequestError, StoreError};
use thiserror::Error;

/// Structured JSON error response for API errors
#[derive(Debug, Serialize)]
#[cfg_attr(test, derive(serde::Deserialize))]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
        }
    }

    pub fn with_details(error: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: Some(details.into()),
        }
    }
}

/// API error types that map to HTTP status codes
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Context not found: {0}")]
    ContextNotFound(String),

    #[error("Settings not configured")]
    NotConfigured,

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Conflict: {0}")]
    Conflict(String),
}

impl From<RequestError> for ApiError {
    fn from(err: RequestError) -> Self {
        match err {
            RequestError::NotConfigured => ApiError::NotConfigured,
            RequestError::NotAttached => ApiError::BadRequest(err.to_string()),
            RequestError::Busy => ApiError::Conflict(err.to_string()),
            RequestError::Store(e) => ApiError::Store(e),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_response) = match &self {
            ApiError::ContextNotFound(key) => {
                tracing::warn!(key = %key, "Context not found");
                (
                    StatusCode::NOT_FOUND,
                    ErrorResponse::with_details("Context not found", format!("Context: {}", key)),
                )
            }
            ApiError::NotConfigured => {
                tracing::warn!("Summary requested before settings were saved");
                (
                    StatusCode::PRECONDITION_FAILED,
                    ErrorResponse::with_details(
                        "Settings not configured",
                        RequestError::NotConfigured.to_string(),
                    ),
                )
            }
            ApiError::Store(store_err) => {
                tracing::error!(error = %store_err, "Store error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::with_details("Store error", store_err.to_string()),
                )
            }
            ApiError::BadRequest(msg) => {
                tracing::warn!(message = %msg, "Bad request");
                (
                    StatusCode::BAD_REQUEST,
                    ErrorResponse::with_details("Bad request", msg.clone()),
                )
            }
            ApiError::Conflict(msg) => {
                tracing::warn!(message = %msg, "Conflict");
                (
                    StatusCode::CONFLICT,
                    ErrorResponse::with_details("Conflict", msg.clone()),
                )
            }
        };

        (status, Json(error_response)).into_response()
    }
}

/// Result type alias for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
