//! Upload endpoints: single conversions and batches.

use axum::{
    extract::{multipart::Field, Multipart, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

use fileforge_core::{
    orchestrator::BatchRejection, ConversionOptions, ConversionRequest, InputFile, JobId,
};

use super::error::ApiError;
use crate::metrics::UPLOAD_BYTES_TOTAL;
use crate::state::AppState;

// ============================================================================
// Request/Response types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct ConvertResponse {
    pub job_id: JobId,
    pub input_format: String,
    pub output_format: String,
}

#[derive(Debug, Serialize)]
pub struct RejectedFile {
    pub index: usize,
    pub file_name: String,
    pub error: String,
}

impl From<BatchRejection> for RejectedFile {
    fn from(r: BatchRejection) -> Self {
        Self {
            index: r.index,
            file_name: r.file_name,
            error: r.error.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BatchResponse {
    /// Files that passed validation and will be converted in order.
    pub accepted: usize,
    pub rejected: Vec<RejectedFile>,
}

/// Form fields shared by both upload endpoints.
#[derive(Debug, Default)]
struct UploadForm {
    files: Vec<InputFile>,
    output_format: Option<String>,
    input_format: Option<String>,
    options: ConversionOptions,
}

impl UploadForm {
    async fn parse(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut form = UploadForm::default();

        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or("").to_string();
            match name.as_str() {
                "file" => form.files.push(read_file(field).await?),
                "output_format" => form.output_format = Some(field.text().await?),
                "input_format" => {
                    let text = field.text().await?;
                    if !text.trim().is_empty() {
                        form.input_format = Some(text);
                    }
                }
                "options" => {
                    let text = field.text().await?;
                    if !text.trim().is_empty() {
                        form.options = serde_json::from_str(&text).map_err(|e| {
                            ApiError::bad_request(format!("Invalid options: {}", e))
                        })?;
                    }
                }
                other => debug!("Ignoring unknown form field {:?}", other),
            }
        }

        Ok(form)
    }

    fn output_format(&self) -> Result<String, ApiError> {
        self.output_format
            .clone()
            .filter(|f| !f.trim().is_empty())
            .ok_or_else(|| ApiError::bad_request("Missing output_format field"))
    }
}

async fn read_file(field: Field<'_>) -> Result<InputFile, ApiError> {
    let name = field.file_name().unwrap_or_default().to_string();
    let mime = field.content_type().map(str::to_string);
    let data = field.bytes().await?;
    UPLOAD_BYTES_TOTAL.inc_by(data.len() as u64);

    let file = InputFile::new(name, data);
    Ok(match mime {
        Some(mime) => file.with_mime_type(mime),
        None => file,
    })
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /convert
///
/// Queues one conversion and returns immediately with the job id.
pub async fn convert(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<ConvertResponse>), ApiError> {
    let mut form = UploadForm::parse(multipart).await?;
    let output_format = form.output_format()?;
    if form.files.len() > 1 {
        return Err(ApiError::bad_request(
            "Only one file is accepted here, use /batch for several",
        ));
    }
    let file = form
        .files
        .pop()
        .ok_or_else(|| ApiError::bad_request("Missing file field"))?;

    let input_format = match form.input_format.take() {
        Some(format) => format,
        None => {
            state
                .registry()
                .detect(&file.name, file.mime_type.as_deref(), &file.data)
                .extension
        }
    };

    // Pairs the registry cannot convert are refused before any job exists
    state
        .orchestrator()
        .router()
        .resolve(&input_format, &output_format)?;

    let request = ConversionRequest::new(file, output_format)
        .with_input_format(input_format)
        .with_options(form.options);
    let input_format = request.input_format.clone().unwrap_or_default();
    let output_format = request.output_format.clone();

    let job_id = state.orchestrator().spawn_conversion(request)?;
    info!(job_id = %job_id, %input_format, %output_format, "Conversion queued");

    Ok((
        StatusCode::ACCEPTED,
        Json(ConvertResponse {
            job_id,
            input_format,
            output_format,
        }),
    ))
}

/// POST /batch
///
/// Queues every `file` part with the same output format and options. Files
/// are converted one after another; invalid files are reported and skipped.
pub async fn submit_batch(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<BatchResponse>), ApiError> {
    let form = UploadForm::parse(multipart).await?;
    let output_format = form.output_format()?;
    if form.files.is_empty() {
        return Err(ApiError::bad_request("Missing file field"));
    }
    let max_files = state.config().limits.max_batch_files;
    if form.files.len() as u64 > max_files {
        return Err(ApiError::bad_request(format!(
            "Too many files: {} (maximum {})",
            form.files.len(),
            max_files
        )));
    }

    let requests: Vec<ConversionRequest> = form
        .files
        .into_iter()
        .map(|file| {
            let request = ConversionRequest::new(file, output_format.clone())
                .with_options(form.options.clone());
            match &form.input_format {
                Some(format) => request.with_input_format(format.clone()),
                None => request,
            }
        })
        .collect();

    let accepted = state.orchestrator().spawn_batch(requests);
    info!(
        accepted = accepted.accepted,
        rejected = accepted.rejected.len(),
        %output_format,
        "Batch queued"
    );

    Ok((
        StatusCode::ACCEPTED,
        Json(BatchResponse {
            accepted: accepted.accepted,
            rejected: accepted.rejected.into_iter().map(Into::into).collect(),
        }),
    ))
}
