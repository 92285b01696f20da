//! Mock conversion backend for testing.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::Duration;

use crate::backend::{
    BackendError, BackendRequest, ConversionBackend, ConversionOutput, OutputFile,
};
use crate::progress::ProgressSink;
use crate::request::InputFile;

/// A recorded backend invocation for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    /// Name of the input file.
    pub file_name: String,
    /// Size of the input in bytes.
    pub file_size: u64,
    /// The request the router built.
    pub request: BackendRequest,
}

#[derive(Debug)]
struct MockState {
    calls: Vec<RecordedCall>,
    next_error: Option<String>,
    failing_formats: HashMap<String, String>,
    output_count: usize,
    delay: Duration,
    progress_steps: Vec<u8>,
}

/// Mock implementation of [`ConversionBackend`].
///
/// Provides controllable behavior for testing:
/// - Record every call for assertions
/// - Fail the next call, or every call for a given format
/// - Emit scripted progress
/// - Simulate slow conversions
///
/// Outputs echo the input bytes with empty names and MIME types, so the
/// router's naming rules apply.
///
/// # Example
///
/// ```rust,ignore
/// use fileforge_core::testing::MockBackend;
///
/// let backend = MockBackend::new();
/// backend.set_next_error("decode error");
/// backend.set_progress_steps(vec![25, 50, 100]);
/// ```
#[derive(Debug)]
pub struct MockBackend {
    state: Mutex<MockState>,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBackend {
    /// Create a new mock backend producing one output per call.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MockState {
                calls: Vec::new(),
                next_error: None,
                failing_formats: HashMap::new(),
                output_count: 1,
                delay: Duration::ZERO,
                progress_steps: Vec::new(),
            }),
        }
    }

    /// Get all recorded calls.
    pub fn recorded_calls(&self) -> Vec<RecordedCall> {
        self.state.lock().calls.clone()
    }

    /// Number of calls received so far.
    pub fn call_count(&self) -> usize {
        self.state.lock().calls.len()
    }

    /// Configure the next call to fail with `message`.
    pub fn set_next_error(&self, message: impl Into<String>) {
        self.state.lock().next_error = Some(message.into());
    }

    /// Fail every call whose input or output format is `format`.
    pub fn fail_for_format(&self, format: &str, message: impl Into<String>) {
        self.state
            .lock()
            .failing_formats
            .insert(format.to_ascii_lowercase(), message.into());
    }

    /// Number of files each call produces. Anything but 1 yields a list.
    pub fn set_output_count(&self, count: usize) {
        self.state.lock().output_count = count;
    }

    /// Simulated conversion time, spread across the progress steps.
    pub fn set_delay(&self, delay: Duration) {
        self.state.lock().delay = delay;
    }

    /// Raw progress values reported during each call.
    pub fn set_progress_steps(&self, steps: Vec<u8>) {
        self.state.lock().progress_steps = steps;
    }

    fn scripted_failure(&self, request: &BackendRequest) -> Option<String> {
        let mut state = self.state.lock();
        if let Some(message) = state.next_error.take() {
            return Some(message);
        }
        state
            .failing_formats
            .get(&request.input_format)
            .or_else(|| state.failing_formats.get(&request.output_format))
            .cloned()
    }
}

#[async_trait]
impl ConversionBackend for MockBackend {
    fn name(&self) -> &str {
        "mock"
    }

    async fn convert(
        &self,
        input: &InputFile,
        request: &BackendRequest,
        progress: ProgressSink,
    ) -> Result<ConversionOutput, BackendError> {
        let (steps, delay, output_count) = {
            let mut state = self.state.lock();
            state.calls.push(RecordedCall {
                file_name: input.name.clone(),
                file_size: input.size(),
                request: request.clone(),
            });
            (
                state.progress_steps.clone(),
                state.delay,
                state.output_count,
            )
        };

        let pause = delay / (steps.len().max(1) as u32);
        for step in &steps {
            if !pause.is_zero() {
                tokio::time::sleep(pause).await;
            }
            progress.report(*step);
        }
        if steps.is_empty() && !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        if let Some(message) = self.scripted_failure(request) {
            return Err(BackendError::rejected(message));
        }

        let file = || OutputFile::new("", "", input.data.clone());
        Ok(match output_count {
            1 => ConversionOutput::Single(file()),
            n => ConversionOutput::Multiple((0..n).map(|_| file()).collect()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::progress_channel;
    use crate::request::ConversionOptions;
    use crate::router::ConversionRoute;

    fn request(input: &str, output: &str) -> BackendRequest {
        BackendRequest {
            route: ConversionRoute::RasterImage,
            input_format: input.to_string(),
            output_format: output.to_string(),
            options: ConversionOptions::default(),
        }
    }

    #[tokio::test]
    async fn test_scripted_progress_and_echo() {
        let backend = MockBackend::new();
        backend.set_progress_steps(vec![20, 60, 100]);
        let (sink, mut rx) = progress_channel(8);

        let input = InputFile::new("a.png", vec![1u8, 2, 3]);
        let output = backend.convert(&input, &request("png", "jpg"), sink).await.unwrap();

        assert_eq!(output.files()[0].data.as_ref(), &[1u8, 2, 3]);
        let mut seen = Vec::new();
        while let Some(p) = rx.recv().await {
            seen.push(p);
        }
        assert_eq!(seen, vec![20, 60, 100]);
        assert_eq!(backend.call_count(), 1);
    }

    #[tokio::test]
    async fn test_next_error_applies_once() {
        let backend = MockBackend::new();
        backend.set_next_error("boom");
        let input = InputFile::new("a.png", vec![1u8]);

        let err = backend
            .convert(&input, &request("png", "jpg"), ProgressSink::noop())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "boom");
        assert!(backend
            .convert(&input, &request("png", "jpg"), ProgressSink::noop())
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_fail_for_format() {
        let backend = MockBackend::new();
        backend.fail_for_format("webp", "unsupported codec");
        let input = InputFile::new("a.png", vec![1u8]);

        assert!(backend
            .convert(&input, &request("png", "jpg"), ProgressSink::noop())
            .await
            .is_ok());
        let err = backend
            .convert(&input, &request("png", "webp"), ProgressSink::noop())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "unsupported codec");
    }
}
