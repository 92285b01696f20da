//! Types for the format registry.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse grouping of formats. Decides which backend family handles a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormatCategory {
    Image,
    Document,
    Spreadsheet,
    Audio,
    Video,
    Archive,
    Data,
    Other,
}

impl FormatCategory {
    /// Every category, in display order.
    pub const ALL: [FormatCategory; 8] = [
        FormatCategory::Image,
        FormatCategory::Document,
        FormatCategory::Spreadsheet,
        FormatCategory::Audio,
        FormatCategory::Video,
        FormatCategory::Archive,
        FormatCategory::Data,
        FormatCategory::Other,
    ];

    /// Returns the category name as used in logs, metrics and the API.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Document => "document",
            Self::Spreadsheet => "spreadsheet",
            Self::Audio => "audio",
            Self::Video => "video",
            Self::Archive => "archive",
            Self::Data => "data",
            Self::Other => "other",
        }
    }

    /// Rough conversion cost in milliseconds per MiB of input.
    ///
    /// Only feeds the initial time estimate shown before any progress arrives.
    pub fn estimate_ms_per_mib(&self) -> f64 {
        match self {
            Self::Image => 100.0,
            Self::Document => 200.0,
            Self::Spreadsheet => 150.0,
            Self::Audio => 400.0,
            Self::Video => 800.0,
            Self::Archive => 300.0,
            Self::Data => 50.0,
            Self::Other => 100.0,
        }
    }
}

impl fmt::Display for FormatCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of the static format table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormatDefinition {
    /// Lower-case extension, unique across the table.
    pub extension: &'static str,
    /// Human readable name.
    pub label: &'static str,
    /// Backend family.
    pub category: FormatCategory,
    /// MIME types that identify this format. The first one is canonical.
    pub mime_types: &'static [&'static str],
    /// Extensions this format can be converted into, in suggestion order.
    pub compatible_outputs: &'static [&'static str],
}

impl FormatDefinition {
    /// Whether `output` is listed as a reachable target.
    pub fn can_convert_to(&self, output: &str) -> bool {
        self.compatible_outputs
            .iter()
            .any(|o| o.eq_ignore_ascii_case(output))
    }

    /// Canonical MIME type.
    pub fn primary_mime(&self) -> &'static str {
        self.mime_types
            .first()
            .copied()
            .unwrap_or("application/octet-stream")
    }
}

/// How a format was recognised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DetectionMethod {
    MagicBytes,
    MimeType,
    Extension,
}

/// Confidence attached to a detection result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionConfidence {
    Low,
    Medium,
    High,
}

/// Result of [`FormatRegistry::detect`](super::FormatRegistry::detect).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatDetection {
    /// Detected extension (may be empty if nothing matched).
    pub extension: String,
    /// MIME type for the detected format.
    pub mime_type: String,
    /// Category of the detected format, `other` when unknown.
    pub category: FormatCategory,
    pub confidence: DetectionConfidence,
    pub detected_by: DetectionMethod,
}
