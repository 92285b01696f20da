use thiserror::Error;

use super::types::{JobId, JobStatus};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JobError {
    /// The job does not exist, or was removed (cancelled).
    #[error("Job not found: {0}")]
    NotFound(JobId),

    #[error("Invalid transition for job {id}: cannot {action} from {status}")]
    InvalidTransition {
        id: JobId,
        status: JobStatus,
        action: &'static str,
    },
}
