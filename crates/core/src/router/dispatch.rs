//! Category-based dispatch to conversion backends.

use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use super::error::ConversionError;
use super::route::ConversionRoute;
use crate::backend::{
    output_file_name, BackendError, BackendKind, BackendRequest, ConversionBackend,
    ConversionOutput, OutputFile,
};
use crate::format::{normalize_extension, FormatCategory, FormatDefinition, FormatRegistry, EXTRACT_TARGET};
use crate::progress::ProgressSink;
use crate::request::{ConversionOptions, InputFile};

/// Resolves `(input, output)` pairs to backends and normalizes their results.
///
/// The router performs no conversion itself. Every pair the registry reports
/// as supported resolves to exactly one [`ConversionRoute`].
#[derive(Clone)]
pub struct ConversionRouter {
    registry: FormatRegistry,
    backends: HashMap<BackendKind, Arc<dyn ConversionBackend>>,
}

impl ConversionRouter {
    /// Creates a router with no backends installed.
    pub fn new(registry: FormatRegistry) -> Self {
        Self {
            registry,
            backends: HashMap::new(),
        }
    }

    /// Installs `backend` for `kind`, replacing any previous one.
    pub fn with_backend(mut self, kind: BackendKind, backend: Arc<dyn ConversionBackend>) -> Self {
        self.register(kind, backend);
        self
    }

    pub fn register(&mut self, kind: BackendKind, backend: Arc<dyn ConversionBackend>) {
        debug!(kind = %kind, backend = backend.name(), "Registering backend");
        self.backends.insert(kind, backend);
    }

    pub fn has_backend(&self, kind: BackendKind) -> bool {
        self.backends.contains_key(&kind)
    }

    /// Installed backend families, in [`BackendKind::ALL`] order.
    pub fn installed_backends(&self) -> Vec<BackendKind> {
        BackendKind::ALL
            .into_iter()
            .filter(|kind| self.backends.contains_key(kind))
            .collect()
    }

    pub fn registry(&self) -> &FormatRegistry {
        &self.registry
    }

    /// Resolves the route for a pair without converting anything.
    pub fn resolve(&self, input: &str, output: &str) -> Result<ConversionRoute, ConversionError> {
        let input = normalize_extension(input);
        let output = normalize_extension(output);

        let def = self
            .registry
            .lookup(&input)
            .ok_or_else(|| ConversionError::unsupported_format(&input))?;

        if !def.can_convert_to(&output) {
            return Err(ConversionError::unsupported_conversion(input, output));
        }

        route_for(&self.registry, def, &output)
            .ok_or_else(|| ConversionError::unsupported_conversion(input, output))
    }

    /// Converts `file` from `input` to `output`.
    ///
    /// Backend progress is forwarded to `progress` unmodified. `options` is
    /// handed to the backend as a copy.
    pub async fn dispatch(
        &self,
        file: &InputFile,
        input: &str,
        output: &str,
        options: &ConversionOptions,
        progress: ProgressSink,
    ) -> Result<ConversionOutput, ConversionError> {
        let route = self.resolve(input, output)?;
        let input = normalize_extension(input);
        let output = normalize_extension(output);

        let kind = route.backend();
        let backend = self
            .backends
            .get(&kind)
            .ok_or_else(|| ConversionError::BackendUnavailable {
                backend: kind,
                input: input.clone(),
                output: output.clone(),
            })?;

        debug!(
            route = route.as_str(),
            backend = backend.name(),
            input_format = %input,
            output_format = %output,
            "Dispatching conversion"
        );

        let request = BackendRequest {
            route,
            input_format: input,
            output_format: output,
            options: options.clone(),
        };

        let result = backend.convert(file, &request, progress).await?;
        self.normalize(result, file, &request.output_format)
    }

    /// Collapses single-element lists and fills in missing names and types.
    fn normalize(
        &self,
        output: ConversionOutput,
        file: &InputFile,
        output_format: &str,
    ) -> Result<ConversionOutput, ConversionError> {
        let default_mime = self
            .registry
            .lookup(output_format)
            .map(FormatDefinition::primary_mime)
            .unwrap_or("application/octet-stream");

        let fill = |mut out: OutputFile, name: String| {
            if out.name.trim().is_empty() {
                out.name = name;
            }
            if out.mime_type.trim().is_empty() {
                out.mime_type = default_mime.to_string();
            }
            out
        };

        match output {
            ConversionOutput::Single(out) => Ok(ConversionOutput::Single(fill(
                out,
                output_file_name(&file.name, output_format),
            ))),
            ConversionOutput::Multiple(files) if files.is_empty() => Err(
                BackendError::rejected("Conversion produced no output").into(),
            ),
            ConversionOutput::Multiple(mut files) if files.len() == 1 => {
                let out = files.remove(0);
                Ok(ConversionOutput::Single(fill(
                    out,
                    output_file_name(&file.name, output_format),
                )))
            }
            ConversionOutput::Multiple(files) => {
                let stem = file
                    .name
                    .rsplit_once('.')
                    .map(|(stem, _)| stem)
                    .unwrap_or(&file.name);
                Ok(ConversionOutput::Multiple(
                    files
                        .into_iter()
                        .enumerate()
                        .map(|(i, out)| {
                            fill(out, format!("{}-{}.{}", stem, i + 1, output_format))
                        })
                        .collect(),
                ))
            }
        }
    }
}

fn is_category(registry: &FormatRegistry, ext: &str, category: FormatCategory) -> bool {
    registry.lookup(ext).is_some_and(|def| def.category == category)
}

/// Picks the route for a pair already known to be listed as compatible.
fn route_for(
    registry: &FormatRegistry,
    input: &FormatDefinition,
    output: &str,
) -> Option<ConversionRoute> {
    use ConversionRoute as R;

    match input.category {
        FormatCategory::Image => match output {
            "pdf" => Some(R::ImageToPdf),
            o if is_category(registry, o, FormatCategory::Image) => Some(R::RasterImage),
            _ => None,
        },
        FormatCategory::Document => match (input.extension, output) {
            ("pdf", "txt") => Some(R::PdfToText),
            ("pdf", o) if is_category(registry, o, FormatCategory::Image) => Some(R::PdfToImage),
            ("docx", "html") => Some(R::DocxToHtml),
            ("docx", "txt") => Some(R::DocxToText),
            ("md", "html") => Some(R::MarkdownToHtml),
            ("html", "txt") => Some(R::HtmlToText),
            ("txt", "html") => Some(R::TextToHtml),
            _ => None,
        },
        FormatCategory::Spreadsheet => match output {
            "csv" | "xlsx" | "json" => Some(R::Spreadsheet),
            _ => None,
        },
        FormatCategory::Data => match output {
            o if is_category(registry, o, FormatCategory::Spreadsheet) => {
                Some(R::DataToSpreadsheet)
            }
            o if is_category(registry, o, FormatCategory::Data) => Some(R::DataTransform),
            _ => None,
        },
        FormatCategory::Audio => {
            is_category(registry, output, FormatCategory::Audio).then_some(R::Audio)
        }
        FormatCategory::Video => match output {
            "gif" => Some(R::VideoToGif),
            o if is_category(registry, o, FormatCategory::Video) => Some(R::VideoTranscode),
            o if is_category(registry, o, FormatCategory::Audio) => Some(R::VideoToAudio),
            _ => None,
        },
        FormatCategory::Archive => (output == EXTRACT_TARGET).then_some(R::ArchiveExtract),
        FormatCategory::Other => None,
    }
}
