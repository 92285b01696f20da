//! Conversion backends.
//!
//! This module provides the `ConversionBackend` trait every format family
//! implements, the shared lazily-loaded engine guard, and the FFmpeg backend
//! for audio and video.
//!
//! # Example
//!
//! ```ignore
//! use fileforge_core::backend::{ConversionBackend, FfmpegBackend};
//!
//! let backend = FfmpegBackend::with_defaults();
//! let output = backend.convert(&input, &request, ProgressSink::noop()).await?;
//! for file in output.files() {
//!     println!("{} ({} bytes)", file.name, file.size());
//! }
//! ```

mod engine;
mod error;
mod ffmpeg;
mod traits;
mod types;

pub use engine::{EngineError, EngineLoader, EngineStatus, SharedEngine};
pub use error::BackendError;
pub use ffmpeg::{FfmpegBackend, FfmpegConfig, FfmpegEngine, FfmpegLoader};
pub use traits::ConversionBackend;
pub use types::{
    output_file_name, BackendKind, BackendRequest, ConversionOutput, OutputFile, OutputFileInfo,
};
