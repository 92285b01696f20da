//! Job types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::backend::{ConversionOutput, OutputFileInfo};
use crate::request::{ConversionOptions, InputFile, InputFileInfo};

/// Unique job identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    /// Generates a fresh random id.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for JobId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for JobId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Lifecycle status.
///
/// ```text
/// queued -> processing -> completed
///    \           \-------> failed
///     \------------------> failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Queued,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One conversion tracked by the [`JobStore`](super::JobStore).
///
/// Once terminal, exactly one of `result` and `error` is set.
#[derive(Debug, Clone)]
pub struct ConversionJob {
    pub id: JobId,
    pub input_file: InputFile,
    pub input_format: String,
    pub output_format: String,
    /// Snapshot taken at creation.
    pub options: ConversionOptions,
    pub status: JobStatus,
    /// 0-100, never decreases.
    pub progress: u8,
    pub result: Option<ConversionOutput>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    /// Set once, on the transition into `completed`.
    pub completed_at: Option<DateTime<Utc>>,
    /// Advisory estimate in milliseconds.
    pub estimated_time_remaining_ms: Option<u64>,
}

impl ConversionJob {
    /// Serializable view without payloads.
    pub fn summary(&self) -> JobSummary {
        JobSummary {
            id: self.id.clone(),
            input_file: self.input_file.info(),
            input_format: self.input_format.clone(),
            output_format: self.output_format.clone(),
            options: self.options.clone(),
            status: self.status,
            progress: self.progress,
            outputs: self
                .result
                .as_ref()
                .map(|r| r.files().iter().map(|f| f.info()).collect()),
            error: self.error.clone(),
            created_at: self.created_at,
            started_at: self.started_at,
            completed_at: self.completed_at,
            estimated_time_remaining_ms: self.estimated_time_remaining_ms,
        }
    }
}

/// Job description suitable for JSON clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSummary {
    pub id: JobId,
    pub input_file: InputFileInfo,
    pub input_format: String,
    pub output_format: String,
    pub options: ConversionOptions,
    pub status: JobStatus,
    pub progress: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outputs: Option<Vec<OutputFileInfo>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_time_remaining_ms: Option<u64>,
}

/// Change notification for push clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum JobEvent {
    Created { job: JobSummary },
    Updated { job: JobSummary },
    Removed { id: JobId },
}
