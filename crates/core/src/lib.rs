pub mod backend;
pub mod clock;
pub mod config;
pub mod format;
pub mod history;
pub mod job;
pub mod metrics;
pub mod orchestrator;
pub mod progress;
pub mod request;
pub mod retention;
pub mod router;
pub mod testing;

pub use backend::{
    BackendError, BackendKind, ConversionBackend, ConversionOutput, FfmpegBackend, OutputFile,
    SharedEngine,
};
pub use clock::{Clock, SystemClock};
pub use config::{
    load_config, load_config_from_str, load_config_or_default, validate_config, Config,
    ConfigError,
};
pub use format::{FormatCategory, FormatDefinition, FormatDetection, FormatRegistry};
pub use history::{create_history_system, HistoryHandle, HistoryRecord, HistorySink, MemoryHistory};
pub use job::{ConversionJob, JobError, JobEvent, JobId, JobStatus, JobStore, JobSummary};
pub use orchestrator::{BatchOrchestrator, OrchestratorConfig, OrchestratorError};
pub use progress::{ProgressBands, ProgressReporter, ProgressSink};
pub use request::{ConversionOptions, ConversionRequest, InputFile, ValidationError};
pub use retention::{RetentionControl, RetentionSettings, RetentionSweeper};
pub use router::{ConversionError, ConversionRoute, ConversionRouter};
