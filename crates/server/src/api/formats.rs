//! Format registry API handlers.

use axum::{
    extract::{Multipart, Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use fileforge_core::{format::normalize_extension, FormatCategory, FormatDefinition, FormatDetection};

use super::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ListFormatsParams {
    /// Only formats in this category
    pub category: Option<FormatCategory>,
}

/// One format with its conversion suggestions.
#[derive(Debug, Serialize)]
pub struct FormatInfoResponse {
    pub format: &'static FormatDefinition,
    pub suggested_outputs: &'static [&'static str],
    /// Preferred one-click target, when the format has one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quick_convert: Option<&'static str>,
}

#[derive(Debug, Serialize)]
pub struct SupportsResponse {
    pub input: String,
    pub output: String,
    pub supported: bool,
}

/// GET /formats
pub async fn list_formats(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListFormatsParams>,
) -> Json<Vec<&'static FormatDefinition>> {
    let registry = state.registry();
    let formats = match params.category {
        Some(category) => registry.formats_in_category(category),
        None => registry.all().iter().collect(),
    };
    Json(formats)
}

/// GET /formats/{ext}
pub async fn get_format(
    State(state): State<Arc<AppState>>,
    Path(ext): Path<String>,
) -> Result<Json<FormatInfoResponse>, ApiError> {
    let registry = state.registry();
    let format = registry
        .lookup(&ext)
        .ok_or_else(|| ApiError::not_found(format!("Unknown format: {}", ext)))?;

    Ok(Json(FormatInfoResponse {
        format,
        suggested_outputs: registry.suggested_outputs(format.extension),
        quick_convert: registry.quick_convert_target(format.extension),
    }))
}

/// GET /formats/{input}/supports/{output}
pub async fn supports(
    State(state): State<Arc<AppState>>,
    Path((input, output)): Path<(String, String)>,
) -> Json<SupportsResponse> {
    let supported = state.registry().is_supported(&input, &output);
    Json(SupportsResponse {
        input: normalize_extension(&input),
        output: normalize_extension(&output),
        supported,
    })
}

/// POST /formats/detect
///
/// Detects the format of the uploaded `file` part without converting it.
pub async fn detect_format(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<FormatDetection>, ApiError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let mime = field.content_type().map(str::to_string);
        let data = field.bytes().await?;
        return Ok(Json(state.registry().detect(
            &file_name,
            mime.as_deref(),
            &data,
        )));
    }
    Err(ApiError::bad_request("Missing file field"))
}
