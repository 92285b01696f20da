//! Job API handlers.

use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use fileforge_core::{
    orchestrator::BatchStatus, ConversionJob, JobId, JobStatus, JobSummary,
};

use super::error::ApiError;
use crate::state::AppState;

// ============================================================================
// Request/Response types
// ============================================================================

/// Which jobs to list.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum JobView {
    #[default]
    All,
    Completed,
    Pending,
    Failed,
}

#[derive(Debug, Deserialize)]
pub struct ListJobsParams {
    #[serde(default)]
    pub view: JobView,
}

#[derive(Debug, Deserialize)]
pub struct ResultParams {
    /// Which output to download when a conversion produced several files
    #[serde(default)]
    pub index: usize,
}

#[derive(Debug, Serialize)]
pub struct RemovedResponse {
    pub removed: Vec<JobId>,
}

#[derive(Debug, Serialize)]
pub struct RetryResponse {
    /// Id of the job that replaces the failed one
    pub job_id: JobId,
    pub retried: JobId,
}

fn summaries(jobs: Vec<ConversionJob>) -> Vec<JobSummary> {
    jobs.iter().map(ConversionJob::summary).collect()
}

fn find_job(state: &AppState, id: &JobId) -> Result<ConversionJob, ApiError> {
    state
        .store()
        .get(id)
        .ok_or_else(|| ApiError::not_found(format!("Job not found: {}", id)))
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /jobs
pub async fn list_jobs(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListJobsParams>,
) -> Json<Vec<JobSummary>> {
    let store = state.store();
    let jobs = match params.view {
        JobView::All => store.list(),
        JobView::Completed => store.completed_jobs(),
        JobView::Pending => store.pending_jobs(),
        JobView::Failed => store.failed_jobs(),
    };
    Json(summaries(jobs))
}

/// GET /jobs/{id}
pub async fn get_job(
    State(state): State<Arc<AppState>>,
    Path(id): Path<JobId>,
) -> Result<Json<JobSummary>, ApiError> {
    Ok(Json(find_job(&state, &id)?.summary()))
}

/// DELETE /jobs/{id}
///
/// Cancels a running job or dismisses a finished one. A running conversion
/// keeps going in its backend but its result is discarded.
pub async fn delete_job(
    State(state): State<Arc<AppState>>,
    Path(id): Path<JobId>,
) -> Result<StatusCode, ApiError> {
    let removed = state
        .store()
        .remove(&id)
        .ok_or_else(|| ApiError::not_found(format!("Job not found: {}", id)))?;
    info!(job_id = %id, status = %removed.status, "Job removed by request");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /jobs/clear-completed
pub async fn clear_completed(State(state): State<Arc<AppState>>) -> Json<RemovedResponse> {
    let removed = state.store().clear_completed();
    info!(count = removed.len(), "Cleared completed jobs");
    Json(RemovedResponse { removed })
}

/// POST /jobs/{id}/retry
pub async fn retry_job(
    State(state): State<Arc<AppState>>,
    Path(id): Path<JobId>,
) -> Result<(StatusCode, Json<RetryResponse>), ApiError> {
    let job_id = state.orchestrator().spawn_retry(&id)?;
    Ok((
        StatusCode::ACCEPTED,
        Json(RetryResponse {
            job_id,
            retried: id,
        }),
    ))
}

/// GET /jobs/{id}/result
///
/// Streams back one output file as raw bytes.
pub async fn download_result(
    State(state): State<Arc<AppState>>,
    Path(id): Path<JobId>,
    Query(params): Query<ResultParams>,
) -> Result<Response, ApiError> {
    let job = find_job(&state, &id)?;
    if job.status != JobStatus::Completed {
        return Err(ApiError::conflict(format!(
            "Job {} is {}, results exist only for completed jobs",
            id, job.status
        )));
    }

    let result = job
        .result
        .ok_or_else(|| ApiError::internal(format!("Completed job {} has no result", id)))?;
    let file = result.files().get(params.index).ok_or_else(|| {
        ApiError::not_found(format!(
            "Job {} has {} output file(s), no index {}",
            id,
            result.len(),
            params.index
        ))
    })?;

    let content_type = if file.mime_type.is_empty() {
        "application/octet-stream".to_string()
    } else {
        file.mime_type.clone()
    };
    // Header values must stay printable ASCII
    let safe_name: String = file
        .name
        .chars()
        .map(|c| match c {
            '"' | '\\' => '_',
            c if c == ' ' || c.is_ascii_graphic() => c,
            _ => '_',
        })
        .collect();
    let disposition = format!("attachment; filename=\"{}\"", safe_name);

    Ok((
        [
            (header::CONTENT_TYPE, content_type),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        Body::from(file.data.clone()),
    )
        .into_response())
}

/// GET /batch/status
pub async fn batch_status(State(state): State<Arc<AppState>>) -> Json<BatchStatus> {
    Json(state.orchestrator().status())
}
