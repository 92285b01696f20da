//! Error types for routing and dispatch.

use thiserror::Error;

use crate::backend::{BackendError, BackendKind};

/// Errors a dispatch can end with. All of them are stored on the job.
#[derive(Debug, Error)]
pub enum ConversionError {
    /// The input format is not in the registry.
    #[error("Unsupported format: {format}")]
    UnsupportedFormat { format: String },

    /// The pair is not convertible.
    #[error("Cannot convert {input} to {output}")]
    UnsupportedConversion { input: String, output: String },

    /// The route resolved but no backend is installed for its family.
    #[error("No {backend} backend is available to convert {input} to {output}")]
    BackendUnavailable {
        backend: BackendKind,
        input: String,
        output: String,
    },

    /// The backend failed. Displays the backend message unaltered.
    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl ConversionError {
    pub fn unsupported_format(format: impl Into<String>) -> Self {
        Self::UnsupportedFormat {
            format: format.into(),
        }
    }

    pub fn unsupported_conversion(input: impl Into<String>, output: impl Into<String>) -> Self {
        Self::UnsupportedConversion {
            input: input.into(),
            output: output.into(),
        }
    }

    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UnsupportedFormat { .. } => "unsupported_format",
            Self::UnsupportedConversion { .. } => "unsupported_conversion",
            Self::BackendUnavailable { .. } => "backend_unavailable",
            Self::Backend(_) => "backend_failure",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_conversion_names_both_formats() {
        let err = ConversionError::unsupported_conversion("heic", "xlsx");
        let msg = err.to_string();
        assert!(msg.contains("heic"));
        assert!(msg.contains("xlsx"));
    }

    #[test]
    fn test_backend_message_passthrough() {
        let err: ConversionError = BackendError::rejected("decode error").into();
        assert_eq!(err.to_string(), "decode error");
        assert_eq!(err.kind(), "backend_failure");
    }
}
