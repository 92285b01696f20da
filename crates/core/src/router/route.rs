//! Transformation kinds and their backend families.

use serde::{Deserialize, Serialize};

use crate::backend::BackendKind;

/// A resolved transformation kind.
///
/// The router picks one of these for every supported `(input, output)` pair;
/// each maps to exactly one backend family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversionRoute {
    /// Image to image.
    RasterImage,
    /// Image(s) into a PDF document.
    ImageToPdf,
    /// PDF pages rendered as images.
    PdfToImage,
    PdfToText,
    DocxToHtml,
    DocxToText,
    MarkdownToHtml,
    HtmlToText,
    TextToHtml,
    /// Between spreadsheet formats, or a sheet to JSON records.
    Spreadsheet,
    /// JSON records into a spreadsheet.
    DataToSpreadsheet,
    /// Between structured data formats.
    DataTransform,
    /// Audio to audio.
    Audio,
    /// Video to another container.
    VideoTranscode,
    VideoToGif,
    /// Audio track extraction.
    VideoToAudio,
    /// Archive entries as separate files.
    ArchiveExtract,
}

impl ConversionRoute {
    /// Backend family serving this route.
    pub fn backend(&self) -> BackendKind {
        match self {
            Self::RasterImage => BackendKind::Image,
            Self::ImageToPdf | Self::PdfToImage | Self::PdfToText => BackendKind::Pdf,
            Self::DocxToHtml
            | Self::DocxToText
            | Self::MarkdownToHtml
            | Self::HtmlToText
            | Self::TextToHtml => BackendKind::Document,
            Self::Spreadsheet | Self::DataToSpreadsheet => BackendKind::Spreadsheet,
            Self::DataTransform => BackendKind::Data,
            Self::Audio => BackendKind::Audio,
            Self::VideoTranscode | Self::VideoToGif | Self::VideoToAudio => BackendKind::Video,
            Self::ArchiveExtract => BackendKind::Archive,
        }
    }

    /// Whether the backend may return several files.
    pub fn may_produce_multiple(&self) -> bool {
        matches!(self, Self::PdfToImage | Self::ArchiveExtract)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RasterImage => "raster_image",
            Self::ImageToPdf => "image_to_pdf",
            Self::PdfToImage => "pdf_to_image",
            Self::PdfToText => "pdf_to_text",
            Self::DocxToHtml => "docx_to_html",
            Self::DocxToText => "docx_to_text",
            Self::MarkdownToHtml => "markdown_to_html",
            Self::HtmlToText => "html_to_text",
            Self::TextToHtml => "text_to_html",
            Self::Spreadsheet => "spreadsheet",
            Self::DataToSpreadsheet => "data_to_spreadsheet",
            Self::DataTransform => "data_transform",
            Self::Audio => "audio",
            Self::VideoTranscode => "video_transcode",
            Self::VideoToGif => "video_to_gif",
            Self::VideoToAudio => "video_to_audio",
            Self::ArchiveExtract => "archive_extract",
        }
    }
}
