//! Pre-job request validation.
//!
//! A request that fails here never becomes a job.

use thiserror::Error;
use tracing::warn;

use super::types::ConversionRequest;

/// Reasons a request is rejected before a job is created.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("File name is empty")]
    EmptyFileName,

    #[error("Output format is empty")]
    MissingOutputFormat,

    #[error("File is too large: {size} bytes (maximum {max} bytes)")]
    FileTooLarge { size: u64, max: u64 },

    #[error("Invalid option {field}: {reason}")]
    InvalidOption { field: String, reason: String },
}

impl ValidationError {
    pub fn invalid_option(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidOption {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Short label for metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::EmptyFileName => "empty_file_name",
            Self::MissingOutputFormat => "missing_output_format",
            Self::FileTooLarge { .. } => "file_too_large",
            Self::InvalidOption { .. } => "invalid_option",
        }
    }
}

/// Size limits applied to inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestLimits {
    pub max_file_size_bytes: u64,
    /// Inputs above this size are accepted with a warning.
    pub warn_file_size_bytes: u64,
}

impl Default for RequestLimits {
    fn default() -> Self {
        Self {
            max_file_size_bytes: 2 * 1024 * 1024 * 1024,
            warn_file_size_bytes: 500 * 1024 * 1024,
        }
    }
}

/// Validates a request against `limits`.
pub fn validate_request(
    request: &ConversionRequest,
    limits: &RequestLimits,
) -> Result<(), ValidationError> {
    if request.file.name.trim().is_empty() {
        return Err(ValidationError::EmptyFileName);
    }

    if request.output_format.trim().is_empty() {
        return Err(ValidationError::MissingOutputFormat);
    }

    let size = request.file.size();
    if size > limits.max_file_size_bytes {
        return Err(ValidationError::FileTooLarge {
            size,
            max: limits.max_file_size_bytes,
        });
    }
    if size > limits.warn_file_size_bytes {
        warn!(
            file = %request.file.name,
            size,
            "Large input, conversion may be slow"
        );
    }

    request.options.validate()
}
