//! Testing utilities and mock implementations.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use fileforge_core::testing::{fixtures, MockBackend};
//!
//! let backend = Arc::new(MockBackend::new());
//! backend.set_progress_steps(vec![50, 100]);
//!
//! let orchestrator = fixtures::orchestrator(backend.clone());
//! orchestrator.start_conversion(fixtures::request("a.png", "jpg")).await?;
//! ```

mod manual_clock;
mod mock_backend;

pub use manual_clock::ManualClock;
pub use mock_backend::{MockBackend, RecordedCall};

/// Test fixtures and helper functions.
pub mod fixtures {
    use std::sync::Arc;

    use crate::backend::{BackendKind, ConversionBackend};
    use crate::format::FormatRegistry;
    use crate::job::JobStore;
    use crate::orchestrator::{BatchOrchestrator, OrchestratorConfig};
    use crate::request::{ConversionRequest, InputFile};
    use crate::router::ConversionRouter;

    /// Minimal PNG header.
    pub const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\n\x00\x00\x00\x0dIHDR";

    /// Minimal zip local file header, as found at the start of xlsx files.
    pub const ZIP_BYTES: &[u8] = b"PK\x03\x04\x14\x00\x00\x00";

    /// Build an input file whose content matches its extension where possible.
    pub fn input_file(name: &str) -> InputFile {
        let lower = name.to_ascii_lowercase();
        let data: &[u8] = if lower.ends_with(".png") {
            PNG_BYTES
        } else if lower.ends_with(".xlsx") || lower.ends_with(".docx") || lower.ends_with(".zip") {
            ZIP_BYTES
        } else {
            b"sample content"
        };
        InputFile::new(name, data.to_vec())
    }

    /// Build a request with the input format left to detection.
    pub fn request(name: &str, output_format: &str) -> ConversionRequest {
        ConversionRequest::new(input_file(name), output_format)
    }

    /// Router with `backend` installed for every family.
    pub fn router(backend: Arc<dyn ConversionBackend>) -> ConversionRouter {
        let mut router = ConversionRouter::new(FormatRegistry::new());
        for kind in BackendKind::ALL {
            router.register(kind, backend.clone());
        }
        router
    }

    /// Orchestrator over a fresh store without history.
    pub fn orchestrator(backend: Arc<dyn ConversionBackend>) -> BatchOrchestrator {
        BatchOrchestrator::new(
            OrchestratorConfig::default(),
            JobStore::new(),
            router(backend),
            None,
        )
    }
}
