//! Format registry.
//!
//! Static knowledge base of the formats the engine understands: their
//! category, MIME types and the formats each one can be converted into.
//!
//! # Example
//!
//! ```
//! use fileforge_core::format::{FormatCategory, FormatRegistry};
//!
//! let registry = FormatRegistry::new();
//! assert!(registry.is_supported("heic", "jpg"));
//! assert_eq!(registry.lookup("CSV").unwrap().category, FormatCategory::Spreadsheet);
//! ```

mod detect;
mod registry;
mod table;
mod types;

pub use registry::{normalize_extension, FormatRegistry};
pub use table::EXTRACT_TARGET;
pub use types::{
    DetectionConfidence, DetectionMethod, FormatCategory, FormatDefinition, FormatDetection,
};
