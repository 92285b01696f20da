//! Trait definitions for the backend module.

use async_trait::async_trait;

use super::error::BackendError;
use super::types::{BackendRequest, ConversionOutput};
use crate::progress::ProgressSink;
use crate::request::InputFile;

/// A format-family transformer.
///
/// Backends are black boxes to the engine: they receive the input bytes and
/// a resolved request, optionally report progress (monotonic 0-100), and
/// return one or more output files or a human-readable rejection.
#[async_trait]
pub trait ConversionBackend: Send + Sync {
    /// Returns the name of this backend implementation.
    fn name(&self) -> &str;

    /// Converts `input` according to `request`.
    ///
    /// Progress sends never block. If the sink is closed (the job was
    /// removed) the backend may stop early; its result is discarded either way.
    async fn convert(
        &self,
        input: &InputFile,
        request: &BackendRequest,
        progress: ProgressSink,
    ) -> Result<ConversionOutput, BackendError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{output_file_name, OutputFile};
    use crate::router::ConversionRoute;

    struct UppercaseBackend;

    #[async_trait]
    impl ConversionBackend for UppercaseBackend {
        fn name(&self) -> &str {
            "uppercase"
        }

        async fn convert(
            &self,
            input: &InputFile,
            request: &BackendRequest,
            progress: ProgressSink,
        ) -> Result<ConversionOutput, BackendError> {
            progress.report(50);
            let text = std::str::from_utf8(&input.data)
                .map_err(|_| BackendError::rejected("input is not UTF-8"))?;
            Ok(ConversionOutput::Single(OutputFile::new(
                output_file_name(&input.name, &request.output_format),
                "text/plain",
                text.to_uppercase().into_bytes(),
            )))
        }
    }

    fn request() -> BackendRequest {
        BackendRequest {
            route: ConversionRoute::HtmlToText,
            input_format: "html".to_string(),
            output_format: "txt".to_string(),
            options: Default::default(),
        }
    }

    #[tokio::test]
    async fn test_backend_contract() {
        let backend = UppercaseBackend;
        let input = InputFile::new("page.html", "hello".as_bytes().to_vec());
        let output = backend
            .convert(&input, &request(), ProgressSink::noop())
            .await
            .unwrap();
        assert_eq!(output.files()[0].name, "page.txt");
        assert_eq!(&output.files()[0].data[..], b"HELLO");
    }

    #[tokio::test]
    async fn test_backend_rejection() {
        let backend = UppercaseBackend;
        let input = InputFile::new("page.html", vec![0xFFu8, 0xFE]);
        let err = backend
            .convert(&input, &request(), ProgressSink::noop())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "input is not UTF-8");
    }
}
