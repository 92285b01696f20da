//! Runtime settings handlers.

use axum::{extract::State, Json};
use serde::Deserialize;
use std::sync::Arc;

use fileforge_core::RetentionSettings;

use super::error::ApiError;
use crate::state::AppState;

/// Partial update; absent fields keep their current value.
#[derive(Debug, Default, Deserialize)]
pub struct RetentionUpdate {
    pub enabled: Option<bool>,
    pub window_minutes: Option<u64>,
}

/// GET /settings/retention
pub async fn get_retention(State(state): State<Arc<AppState>>) -> Json<RetentionSettings> {
    Json(state.retention().get())
}

/// PUT /settings/retention
pub async fn update_retention(
    State(state): State<Arc<AppState>>,
    Json(update): Json<RetentionUpdate>,
) -> Result<Json<RetentionSettings>, ApiError> {
    let current = state.retention().get();
    let settings = RetentionSettings {
        enabled: update.enabled.unwrap_or(current.enabled),
        window_minutes: update.window_minutes.unwrap_or(current.window_minutes),
    };

    state.retention().set(settings)?;
    state.ws_broadcaster().retention_changed(settings);
    Ok(Json(settings))
}
