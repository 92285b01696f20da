//! Request types.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use super::options::ConversionOptions;

/// A user-supplied file held in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputFile {
    pub name: String,
    /// MIME type declared by the client, if any.
    pub mime_type: Option<String>,
    pub data: Bytes,
}

impl InputFile {
    pub fn new(name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            mime_type: None,
            data: data.into(),
        }
    }

    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    /// Size in bytes.
    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }

    /// Metadata without the payload.
    pub fn info(&self) -> InputFileInfo {
        InputFileInfo {
            name: self.name.clone(),
            mime_type: self.mime_type.clone(),
            size: self.size(),
        }
    }
}

/// Serializable description of an [`InputFile`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputFileInfo {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    pub size: u64,
}

/// One conversion to perform.
#[derive(Debug, Clone)]
pub struct ConversionRequest {
    pub file: InputFile,
    /// Input format. When `None` the format is detected from the file.
    pub input_format: Option<String>,
    pub output_format: String,
    pub options: ConversionOptions,
}

impl ConversionRequest {
    pub fn new(file: InputFile, output_format: impl Into<String>) -> Self {
        Self {
            file,
            input_format: None,
            output_format: output_format.into(),
            options: ConversionOptions::default(),
        }
    }

    pub fn with_input_format(mut self, input_format: impl Into<String>) -> Self {
        self.input_format = Some(input_format.into());
        self
    }

    pub fn with_options(mut self, options: ConversionOptions) -> Self {
        self.options = options;
        self
    }
}
