//! Types for the batch orchestrator.

use serde::Serialize;
use thiserror::Error;

use crate::job::{JobId, JobStatus};
use crate::request::ValidationError;

/// Errors returned to callers of the orchestrator.
///
/// Per-job conversion failures are never reported here; they are stored on
/// the job.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum OrchestratorError {
    /// Request rejected before a job was created.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Job not found.
    #[error("Job not found: {0}")]
    JobNotFound(JobId),

    /// Only failed jobs can be retried.
    #[error("Job {id} is {status}, only failed jobs can be retried")]
    NotRetryable { id: JobId, status: JobStatus },
}

/// A batch entry rejected by validation.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchRejection {
    /// Position of the request in the submitted batch.
    pub index: usize,
    pub file_name: String,
    pub error: ValidationError,
}

/// Outcome of a batch that ran to completion.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchReport {
    /// Jobs created, in submission order.
    pub jobs: Vec<JobId>,
    pub rejected: Vec<BatchRejection>,
}

/// Acknowledgement for a batch handed to a background task.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchAccepted {
    /// Requests that passed validation and will become jobs.
    pub accepted: usize,
    pub rejected: Vec<BatchRejection>,
}

/// Snapshot of the orchestrator's activity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchStatus {
    /// Whether a batch is currently running.
    pub in_progress: bool,
    /// Jobs queued or processing, batch or not.
    pub pending_jobs: usize,
}
