//! Error types for conversion backends.

use std::path::PathBuf;
use thiserror::Error;

use super::engine::EngineError;

/// Errors a backend can return.
///
/// The `Display` output of [`BackendError::Rejected`] is the backend's message
/// unaltered; it ends up verbatim on the failed job.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The backend refused or failed to convert the input.
    #[error("{message}")]
    Rejected { message: String },

    /// The backend engine could not be loaded.
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// FFmpeg binary not found.
    #[error("FFmpeg not found at path: {path}")]
    FfmpegNotFound { path: PathBuf },

    /// An external process exited unsuccessfully.
    #[error("{reason}")]
    ProcessFailed {
        reason: String,
        stderr: Option<String>,
    },

    /// I/O error while staging input or reading output.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl BackendError {
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected {
            message: message.into(),
        }
    }

    pub fn process_failed(reason: impl Into<String>, stderr: Option<String>) -> Self {
        Self::ProcessFailed {
            reason: reason.into(),
            stderr,
        }
    }
}
