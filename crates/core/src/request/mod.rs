//! Conversion requests: input files, options and pre-job validation.

mod options;
mod types;
mod validate;

pub use options::{AudioChannels, ConversionOptions, CropRect, Resolution};
pub use types::{ConversionRequest, InputFile, InputFileInfo};
pub use validate::{validate_request, RequestLimits, ValidationError};
