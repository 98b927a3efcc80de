//! Endpoint settings API routes.

use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use serde::{Deserialize, Serialize};
use tab_digest_core::Settings;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateSettingsRequest {
    base_url: Option<String>,
    model: Option<String>,
    max_tokens: Option<i64>,
}

/// Settings plus what they resolve to.
#[derive(Debug, Serialize)]
#[cfg_attr(test, derive(Deserialize))]
#[serde(rename_all = "camelCase")]
pub struct SettingsResponse {
    #[serde(flatten)]
    pub settings: Settings,
    /// False until the user has saved an endpoint or model.
    pub configured: bool,
    pub completions_url: String,
}

async fn settings_response(state: &AppState) -> ApiResult<SettingsResponse> {
    let settings = Settings::load(state.store.as_ref()).await?;
    let configured = Settings::is_configured(state.store.as_ref()).await?;
    Ok(SettingsResponse {
        completions_url: settings.completions_url(),
        settings,
        configured,
    })
}

/// GET /api/settings - Read current settings.
async fn get_settings(State(state): State<Arc<AppState>>) -> ApiResult<Json<SettingsResponse>> {
    Ok(Json(settings_response(&state).await?))
}

/// PUT /api/settings - Update settings (partial).
async fn update_settings(
    State(state): State<Arc<AppState>>,
    Json(body): Json<UpdateSettingsRequest>,
) -> ApiResult<Json<SettingsResponse>> {
    if let Some(ref url) = body.base_url {
        let url = url.trim();
        if !url.is_empty() && !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ApiError::BadRequest(format!(
                "Invalid base URL '{url}'. It must start with http:// or https://"
            )));
        }
    }

    if let Some(t) = body.max_tokens {
        if t == 0 || t < -1 {
            return Err(ApiError::BadRequest(
                "Max tokens must be a positive number, or -1 for no limit".to_string(),
            ));
        }
    }

    let current = Settings::load(state.store.as_ref()).await?;
    let next = Settings {
        base_url: body.base_url.unwrap_or(current.base_url),
        model: body.model.unwrap_or(current.model),
        max_tokens: body.max_tokens.unwrap_or(current.max_tokens),
    };
    next.save(state.store.as_ref()).await?;

    Ok(Json(settings_response(&state).await?))
}

/// Create the settings routes router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/settings", get(get_settings).put(update_settings))
}
