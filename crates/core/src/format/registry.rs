//! Format registry: lookups and compatibility queries over the static table.

use tracing::debug;

use super::detect::{extension_of, sniff};
use super::table::{FORMATS, QUICK_CONVERT};
use super::types::{
    DetectionConfidence, DetectionMethod, FormatCategory, FormatDefinition, FormatDetection,
};

const ZIP_CONTAINERS: &[&str] = &["docx", "xlsx"];

/// Normalizes a user-supplied extension: trims whitespace, drops a leading
/// dot and lower-cases it.
pub fn normalize_extension(ext: &str) -> String {
    ext.trim().trim_start_matches('.').to_ascii_lowercase()
}

/// Read-only knowledge base of supported formats.
///
/// All queries are case-insensitive and pure.
#[derive(Debug, Clone, Copy)]
pub struct FormatRegistry {
    formats: &'static [FormatDefinition],
}

impl Default for FormatRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl FormatRegistry {
    /// Registry over the built-in format table.
    pub fn new() -> Self {
        Self { formats: FORMATS }
    }

    /// Looks up a format by extension.
    pub fn lookup(&self, extension: &str) -> Option<&'static FormatDefinition> {
        let ext = normalize_extension(extension);
        self.formats.iter().find(|f| f.extension == ext)
    }

    /// True iff `input` is known and `output` is one of its compatible outputs.
    pub fn is_supported(&self, input: &str, output: &str) -> bool {
        let output = normalize_extension(output);
        self.lookup(input)
            .is_some_and(|def| def.can_convert_to(&output))
    }

    /// Compatible outputs for `input` in suggestion order, empty if unknown.
    pub fn suggested_outputs(&self, input: &str) -> &'static [&'static str] {
        self.lookup(input)
            .map(|def| def.compatible_outputs)
            .unwrap_or(&[])
    }

    /// Every known format, in table order.
    pub fn all(&self) -> &'static [FormatDefinition] {
        self.formats
    }

    /// Formats belonging to `category`, in table order.
    pub fn formats_in_category(&self, category: FormatCategory) -> Vec<&'static FormatDefinition> {
        self.formats
            .iter()
            .filter(|f| f.category == category)
            .collect()
    }

    /// First extension claiming `mime`.
    pub fn extension_for_mime(&self, mime: &str) -> Option<&'static str> {
        let mime = mime.trim().to_ascii_lowercase();
        self.formats
            .iter()
            .find(|f| f.mime_types.iter().any(|m| *m == mime))
            .map(|f| f.extension)
    }

    /// Preferred one-click target for `input`, only if that pair is supported.
    pub fn quick_convert_target(&self, input: &str) -> Option<&'static str> {
        let input = normalize_extension(input);
        QUICK_CONVERT
            .iter()
            .find(|(from, _)| *from == input)
            .map(|(_, to)| *to)
            .filter(|to| self.is_supported(&input, to))
    }

    /// Category for `extension`, [`FormatCategory::Other`] when unknown.
    pub fn category_of(&self, extension: &str) -> FormatCategory {
        self.lookup(extension)
            .map(|def| def.category)
            .unwrap_or(FormatCategory::Other)
    }

    /// Detects the format of a file.
    ///
    /// Magic bytes win over the declared MIME type, which wins over the file
    /// name extension. A file that matches nothing is reported with its raw
    /// extension, category `other` and low confidence.
    pub fn detect(&self, file_name: &str, mime: Option<&str>, head: &[u8]) -> FormatDetection {
        if let Some(def) = sniff(head)
            .map(|ext| self.refine_container(ext, file_name))
            .and_then(|ext| self.lookup(ext))
        {
            debug!(file_name, extension = def.extension, "Detected format from magic bytes");
            return self.detection(def, DetectionConfidence::High, DetectionMethod::MagicBytes);
        }

        if let Some(def) = mime
            .and_then(|m| self.extension_for_mime(m))
            .and_then(|ext| self.lookup(ext))
        {
            return self.detection(def, DetectionConfidence::Medium, DetectionMethod::MimeType);
        }

        let extension = extension_of(file_name);
        match self.lookup(&extension) {
            Some(def) => self.detection(def, DetectionConfidence::Low, DetectionMethod::Extension),
            None => FormatDetection {
                extension,
                mime_type: mime
                    .filter(|m| !m.is_empty())
                    .unwrap_or("application/octet-stream")
                    .to_string(),
                category: FormatCategory::Other,
                confidence: DetectionConfidence::Low,
                detected_by: DetectionMethod::Extension,
            },
        }
    }

    /// Office documents are zip files; trust a matching extension over the bare signature.
    fn refine_container<'a>(&self, sniffed: &'a str, file_name: &'a str) -> &'a str {
        if sniffed != "zip" {
            return sniffed;
        }
        match self.lookup(&extension_of(file_name)) {
            Some(def) if ZIP_CONTAINERS.contains(&def.extension) => def.extension,
            _ => sniffed,
        }
    }

    fn detection(
        &self,
        def: &FormatDefinition,
        confidence: DetectionConfidence,
        detected_by: DetectionMethod,
    ) -> FormatDetection {
        FormatDetection {
            extension: def.extension.to_string(),
            mime_type: def.primary_mime().to_string(),
            category: def.category,
            confidence,
            detected_by,
        }
    }
}
