//! Static format table.
//!
//! Every `(input, output)` pair listed here must have a branch in the
//! conversion router; the router tests walk this table to check that.

use super::types::{FormatCategory, FormatDefinition};

/// Virtual output used for archive extraction.
pub const EXTRACT_TARGET: &str = "extract";

const fn def(
    extension: &'static str,
    label: &'static str,
    category: FormatCategory,
    mime_types: &'static [&'static str],
    compatible_outputs: &'static [&'static str],
) -> FormatDefinition {
    FormatDefinition {
        extension,
        label,
        category,
        mime_types,
        compatible_outputs,
    }
}

use FormatCategory::*;

pub(crate) static FORMATS: &[FormatDefinition] = &[
    // Images
    def("jpg", "JPEG Image", Image, &["image/jpeg"], &["png", "webp", "gif", "bmp", "ico", "pdf"]),
    def("jpeg", "JPEG Image", Image, &["image/jpeg"], &["jpg", "png", "webp", "gif", "bmp", "ico", "pdf"]),
    def("png", "PNG Image", Image, &["image/png"], &["jpg", "webp", "gif", "bmp", "ico", "pdf"]),
    def("webp", "WebP Image", Image, &["image/webp"], &["jpg", "png", "gif", "bmp", "pdf"]),
    def("gif", "GIF Image", Image, &["image/gif"], &["jpg", "png", "webp", "bmp", "pdf"]),
    def("bmp", "Bitmap Image", Image, &["image/bmp"], &["jpg", "png", "webp", "gif", "pdf"]),
    def("ico", "Icon", Image, &["image/x-icon", "image/vnd.microsoft.icon"], &["png", "jpg"]),
    def("tiff", "TIFF Image", Image, &["image/tiff"], &["jpg", "png", "webp", "pdf"]),
    def("heic", "HEIC Image", Image, &["image/heic"], &["jpg", "png", "webp", "pdf"]),
    def("heif", "HEIF Image", Image, &["image/heif"], &["jpg", "png", "webp", "pdf"]),
    def("svg", "SVG Image", Image, &["image/svg+xml"], &["png", "jpg", "webp"]),
    // Documents
    def("pdf", "PDF Document", Document, &["application/pdf"], &["jpg", "png", "webp", "txt"]),
    def(
        "docx",
        "Word Document",
        Document,
        &["application/vnd.openxmlformats-officedocument.wordprocessingml.document"],
        &["html", "txt"],
    ),
    def("md", "Markdown", Document, &["text/markdown"], &["html"]),
    def("html", "HTML Document", Document, &["text/html"], &["txt"]),
    def("txt", "Plain Text", Document, &["text/plain"], &["html"]),
    // Spreadsheets
    def(
        "xlsx",
        "Excel Workbook",
        Spreadsheet,
        &["application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"],
        &["csv", "json"],
    ),
    def("csv", "CSV", Spreadsheet, &["text/csv"], &["xlsx", "json"]),
    // Data
    def("json", "JSON", Data, &["application/json"], &["xlsx", "csv", "yaml", "xml", "toml"]),
    def("yaml", "YAML", Data, &["application/yaml", "text/yaml"], &["json"]),
    def("yml", "YAML", Data, &["application/yaml", "text/yaml"], &["json"]),
    def("xml", "XML", Data, &["application/xml", "text/xml"], &["json"]),
    def("toml", "TOML", Data, &["application/toml"], &["json"]),
    // Audio
    def("mp3", "MP3 Audio", Audio, &["audio/mpeg"], &["wav", "ogg", "aac", "m4a", "flac", "opus"]),
    def("wav", "WAV Audio", Audio, &["audio/wav", "audio/x-wav"], &["mp3", "ogg", "aac", "m4a", "flac", "opus"]),
    def("ogg", "Ogg Audio", Audio, &["audio/ogg"], &["mp3", "wav", "aac", "m4a", "flac", "opus"]),
    def("aac", "AAC Audio", Audio, &["audio/aac"], &["mp3", "wav", "ogg", "m4a", "flac", "opus"]),
    def("m4a", "M4A Audio", Audio, &["audio/mp4", "audio/x-m4a"], &["mp3", "wav", "ogg", "aac", "flac", "opus"]),
    def("flac", "FLAC Audio", Audio, &["audio/flac"], &["mp3", "wav", "ogg", "aac", "m4a", "opus"]),
    def("opus", "Opus Audio", Audio, &["audio/opus"], &["mp3", "wav", "ogg", "aac", "m4a", "flac"]),
    // Video
    def("mp4", "MP4 Video", Video, &["video/mp4"], &["webm", "avi", "mkv", "mov", "gif", "mp3"]),
    def("webm", "WebM Video", Video, &["video/webm"], &["mp4", "avi", "mkv", "mov", "gif", "mp3"]),
    def("avi", "AVI Video", Video, &["video/x-msvideo"], &["mp4", "webm", "mkv", "mov", "gif", "mp3"]),
    def("mkv", "Matroska Video", Video, &["video/x-matroska"], &["mp4", "webm", "avi", "mov", "gif", "mp3"]),
    def("mov", "QuickTime Video", Video, &["video/quicktime"], &["mp4", "webm", "avi", "mkv", "gif", "mp3"]),
    // Archives
    def(
        "zip",
        "ZIP Archive",
        Archive,
        &["application/zip", "application/x-zip-compressed"],
        &[EXTRACT_TARGET],
    ),
];

/// Preferred one-click targets.
pub(crate) static QUICK_CONVERT: &[(&str, &str)] = &[
    ("heic", "jpg"),
    ("webp", "png"),
    ("png", "jpg"),
    ("pdf", "jpg"),
    ("xlsx", "csv"),
    ("csv", "xlsx"),
    ("docx", "html"),
    ("gif", "png"),
];

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_extensions_are_unique_and_lowercase() {
        let mut seen = HashSet::new();
        for format in FORMATS {
            assert_eq!(format.extension, format.extension.to_ascii_lowercase());
            assert!(seen.insert(format.extension), "duplicate {}", format.extension);
        }
    }

    #[test]
    fn test_no_identity_outputs() {
        for format in FORMATS {
            assert!(
                !format.compatible_outputs.contains(&format.extension),
                "{} lists itself as an output",
                format.extension
            );
        }
    }

    #[test]
    fn test_every_format_has_a_mime_type() {
        for format in FORMATS {
            assert!(!format.mime_types.is_empty(), "{}", format.extension);
        }
    }
}
