//! Types shared by all conversion backends.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::request::ConversionOptions;
use crate::router::ConversionRoute;

/// Backend family. The router installs at most one backend per kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    Image,
    Pdf,
    Document,
    Spreadsheet,
    Data,
    Audio,
    Video,
    Archive,
}

impl BackendKind {
    pub const ALL: [BackendKind; 8] = [
        BackendKind::Image,
        BackendKind::Pdf,
        BackendKind::Document,
        BackendKind::Spreadsheet,
        BackendKind::Data,
        BackendKind::Audio,
        BackendKind::Video,
        BackendKind::Archive,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Pdf => "pdf",
            Self::Document => "document",
            Self::Spreadsheet => "spreadsheet",
            Self::Data => "data",
            Self::Audio => "audio",
            Self::Video => "video",
            Self::Archive => "archive",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a backend is asked to do.
#[derive(Debug, Clone, PartialEq)]
pub struct BackendRequest {
    /// Resolved transformation kind.
    pub route: ConversionRoute,
    /// Normalized input extension.
    pub input_format: String,
    /// Normalized output extension.
    pub output_format: String,
    pub options: ConversionOptions,
}

/// One produced file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputFile {
    pub name: String,
    pub mime_type: String,
    pub data: Bytes,
}

impl OutputFile {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            data: data.into(),
        }
    }

    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }

    pub fn info(&self) -> OutputFileInfo {
        OutputFileInfo {
            name: self.name.clone(),
            mime_type: self.mime_type.clone(),
            size: self.size(),
        }
    }
}

/// Serializable description of an [`OutputFile`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputFileInfo {
    pub name: String,
    pub mime_type: String,
    pub size: u64,
}

/// Result of a conversion: a single file, or an ordered list of files
/// (PDF pages, extracted archive entries).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversionOutput {
    Single(OutputFile),
    Multiple(Vec<OutputFile>),
}

impl ConversionOutput {
    /// Produced files in order.
    pub fn files(&self) -> &[OutputFile] {
        match self {
            Self::Single(file) => std::slice::from_ref(file),
            Self::Multiple(files) => files,
        }
    }

    pub fn len(&self) -> usize {
        self.files().len()
    }

    pub fn is_empty(&self) -> bool {
        self.files().is_empty()
    }

    pub fn total_size(&self) -> u64 {
        self.files().iter().map(OutputFile::size).sum()
    }
}

/// Replaces the extension of `input_name` with `extension`, appending it
/// when the name has none.
pub fn output_file_name(input_name: &str, extension: &str) -> String {
    match input_name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => format!("{}.{}", stem, extension),
        _ => format!("{}.{}", input_name, extension),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_file_name() {
        assert_eq!(output_file_name("photo.png", "jpg"), "photo.jpg");
        assert_eq!(output_file_name("a.b.c.xlsx", "csv"), "a.b.c.csv");
        assert_eq!(output_file_name("README", "txt"), "README.txt");
        assert_eq!(output_file_name(".hidden", "txt"), ".hidden.txt");
    }

    #[test]
    fn test_conversion_output_files() {
        let single = ConversionOutput::Single(OutputFile::new("a.jpg", "image/jpeg", vec![1u8, 2]));
        assert_eq!(single.len(), 1);
        assert_eq!(single.total_size(), 2);

        let multiple = ConversionOutput::Multiple(vec![
            OutputFile::new("p1.png", "image/png", vec![1u8]),
            OutputFile::new("p2.png", "image/png", vec![1u8, 2, 3]),
        ]);
        assert_eq!(multiple.files()[1].name, "p2.png");
        assert_eq!(multiple.total_size(), 4);
    }

    #[test]
    fn test_backend_kind_display() {
        assert_eq!(BackendKind::Spreadsheet.to_string(), "spreadsheet");
    }
}
