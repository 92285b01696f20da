use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::job::{ConversionJob, JobId, JobStatus};

/// Entry written to conversion history on every terminal transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub id: JobId,
    pub input_name: String,
    pub input_format: String,
    pub output_format: String,
    pub timestamp: DateTime<Utc>,
    pub file_size: u64,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl HistoryRecord {
    /// Builds a record from a terminal job. `None` for non-terminal jobs.
    pub fn from_job(job: &ConversionJob, timestamp: DateTime<Utc>) -> Option<Self> {
        if !job.status.is_terminal() {
            return None;
        }
        Some(Self {
            id: job.id.clone(),
            input_name: job.input_file.name.clone(),
            input_format: job.input_format.clone(),
            output_format: job.output_format.clone(),
            timestamp,
            file_size: job.input_file.size(),
            success: job.status == JobStatus::Completed,
            error: job.error.clone(),
        })
    }
}
