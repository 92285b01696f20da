//! Batch orchestrator implementation.
//!
//! Drives conversion jobs through the store:
//! - Direct conversions run as soon as they are submitted, possibly concurrently
//! - Batches run strictly one request at a time, in submission order

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::format::FormatCategory;
use crate::history::{HistoryHandle, HistoryRecord};
use crate::job::{ConversionJob, JobId, JobStatus, JobStore};
use crate::metrics;
use crate::progress::{progress_channel, ProgressReporter};
use crate::request::{validate_request, ConversionRequest, ValidationError};
use crate::router::ConversionRouter;

use super::config::OrchestratorConfig;
use super::types::{BatchAccepted, BatchRejection, BatchReport, BatchStatus, OrchestratorError};

/// Counts a batch as unfinished until dropped, including when dropped mid-run.
///
/// The count is taken when the batch is accepted, so batches waiting behind
/// the batch lock keep the orchestrator busy.
struct PendingBatch<'a>(&'a AtomicUsize);

impl Drop for PendingBatch<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// The batch orchestrator: creates jobs and drives them through the router.
///
/// Every per-job failure ends up on the job itself; only validation and
/// retry preconditions are reported to the caller.
pub struct BatchOrchestrator {
    config: OrchestratorConfig,
    store: JobStore,
    router: ConversionRouter,
    history: Option<HistoryHandle>,

    // Runtime state
    batch_lock: Mutex<()>,
    pending_batches: AtomicUsize,
}

impl BatchOrchestrator {
    /// Create a new orchestrator.
    pub fn new(
        config: OrchestratorConfig,
        store: JobStore,
        router: ConversionRouter,
        history: Option<HistoryHandle>,
    ) -> Self {
        Self {
            config,
            store,
            router,
            history,
            batch_lock: Mutex::new(()),
            pending_batches: AtomicUsize::new(0),
        }
    }

    pub fn store(&self) -> &JobStore {
        &self.store
    }

    pub fn router(&self) -> &ConversionRouter {
        &self.router
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Whether a batch has been accepted and has not finished yet.
    pub fn is_batch_in_progress(&self) -> bool {
        self.pending_batches.load(Ordering::SeqCst) > 0
    }

    pub fn status(&self) -> BatchStatus {
        BatchStatus {
            in_progress: self.is_batch_in_progress(),
            pending_jobs: self.store.pending_jobs().len(),
        }
    }

    /// Converts one file and waits for the job to reach a terminal state.
    pub async fn start_conversion(
        &self,
        request: ConversionRequest,
    ) -> Result<JobId, ValidationError> {
        let request = self.prepare(request)?;
        let id = self.create_job(request);
        self.run_job(&id).await;
        Ok(id)
    }

    /// Creates the job and converts it in the background.
    ///
    /// Returns as soon as the job is queued.
    pub fn spawn_conversion(
        self: &Arc<Self>,
        request: ConversionRequest,
    ) -> Result<JobId, ValidationError> {
        let request = self.prepare(request)?;
        let id = self.create_job(request);

        let orchestrator = Arc::clone(self);
        let job_id = id.clone();
        tokio::spawn(async move {
            orchestrator.run_job(&job_id).await;
        });

        Ok(id)
    }

    /// Runs `requests` one after another and waits for all of them.
    ///
    /// Each request is created, started and finished before the next one is
    /// created. Invalid requests are skipped and reported; a failing
    /// conversion does not stop the batch.
    pub async fn submit_batch(&self, requests: Vec<ConversionRequest>) -> BatchReport {
        let mut report = BatchReport::default();
        let mut valid = Vec::with_capacity(requests.len());
        for (index, request) in requests.into_iter().enumerate() {
            let file_name = request.file.name.clone();
            match self.prepare(request) {
                Ok(request) => valid.push(request),
                Err(error) => report.rejected.push(BatchRejection {
                    index,
                    file_name,
                    error,
                }),
            }
        }

        self.pending_batches.fetch_add(1, Ordering::SeqCst);
        report.jobs = self.run_batch(valid).await;
        report
    }

    /// Validates `requests` and runs the valid ones as a batch in the background.
    pub fn spawn_batch(self: &Arc<Self>, requests: Vec<ConversionRequest>) -> BatchAccepted {
        let mut rejected = Vec::new();
        let mut valid = Vec::with_capacity(requests.len());
        for (index, request) in requests.into_iter().enumerate() {
            let file_name = request.file.name.clone();
            match self.prepare(request) {
                Ok(request) => valid.push(request),
                Err(error) => rejected.push(BatchRejection {
                    index,
                    file_name,
                    error,
                }),
            }
        }

        let accepted = valid.len();
        self.pending_batches.fetch_add(1, Ordering::SeqCst);
        let orchestrator = Arc::clone(self);
        tokio::spawn(async move {
            orchestrator.run_batch(valid).await;
        });

        BatchAccepted { accepted, rejected }
    }

    /// Re-submits a failed job's input as a new job and removes the old one.
    ///
    /// Waits for the new job to finish.
    pub async fn retry(&self, id: &JobId) -> Result<JobId, OrchestratorError> {
        let new_id = self.requeue(id)?;
        self.run_job(&new_id).await;
        Ok(new_id)
    }

    /// Like [`retry`](Self::retry), but runs the new job in the background.
    pub fn spawn_retry(self: &Arc<Self>, id: &JobId) -> Result<JobId, OrchestratorError> {
        let new_id = self.requeue(id)?;

        let orchestrator = Arc::clone(self);
        let job_id = new_id.clone();
        tokio::spawn(async move {
            orchestrator.run_job(&job_id).await;
        });

        Ok(new_id)
    }

    fn requeue(&self, id: &JobId) -> Result<JobId, OrchestratorError> {
        let job = self
            .store
            .get(id)
            .ok_or_else(|| OrchestratorError::JobNotFound(id.clone()))?;
        if job.status != JobStatus::Failed {
            return Err(OrchestratorError::NotRetryable {
                id: id.clone(),
                status: job.status,
            });
        }

        let request = ConversionRequest::new(job.input_file, job.output_format)
            .with_input_format(job.input_format)
            .with_options(job.options);
        let request = self.prepare(request)?;

        self.store.remove(id);
        let new_id = self.create_job(request);
        info!(old_job_id = %id, job_id = %new_id, "Retrying failed job");
        Ok(new_id)
    }

    /// Runs one accepted batch. The caller has already counted it as pending.
    async fn run_batch(&self, requests: Vec<ConversionRequest>) -> Vec<JobId> {
        let _pending = PendingBatch(&self.pending_batches);
        let _serial = self.batch_lock.lock().await;
        metrics::BATCHES_SUBMITTED.inc();

        let total = requests.len();
        info!(total, "Batch started");

        let mut jobs = Vec::with_capacity(total);
        for request in requests {
            let id = self.create_job(request);
            self.run_job(&id).await;
            jobs.push(id);
        }

        let failed = jobs
            .iter()
            .filter_map(|id| self.store.get(id))
            .filter(|job| job.status == JobStatus::Failed)
            .count();
        info!(total, failed, "Batch finished");
        jobs
    }

    /// Validates a request and fills in the input format when it is missing.
    fn prepare(&self, request: ConversionRequest) -> Result<ConversionRequest, ValidationError> {
        if let Err(e) = validate_request(&request, &self.config.limits) {
            warn!(file_name = %request.file.name, reason = e.reason(), "Rejected request: {}", e);
            metrics::VALIDATION_REJECTIONS
                .with_label_values(&[e.reason()])
                .inc();
            return Err(e);
        }

        let has_input_format = request
            .input_format
            .as_deref()
            .is_some_and(|f| !f.trim().is_empty());
        if has_input_format {
            return Ok(request);
        }

        let detection = self.router.registry().detect(
            &request.file.name,
            request.file.mime_type.as_deref(),
            &request.file.data,
        );
        debug!(
            file_name = %request.file.name,
            extension = %detection.extension,
            detected_by = ?detection.detected_by,
            "Detected input format"
        );
        Ok(request.with_input_format(detection.extension))
    }

    fn create_job(&self, request: ConversionRequest) -> JobId {
        let input_format = request.input_format.unwrap_or_default();
        self.store.create(
            request.file,
            &input_format,
            &request.output_format,
            request.options,
        )
    }

    /// Drives one queued job to a terminal state.
    ///
    /// Returns early without touching the job if it was removed meanwhile.
    async fn run_job(&self, id: &JobId) {
        let Some(job) = self.store.get(id) else {
            debug!(job_id = %id, "Job removed before it started");
            return;
        };
        let category = self.router.registry().category_of(&job.input_format);
        let started = Instant::now();

        if let Err(e) = self.router.resolve(&job.input_format, &job.output_format) {
            let result = self.store.fail(id, e.to_string());
            self.finish(result, category, e.kind(), started);
            return;
        }

        if let Err(e) = self.store.begin(id) {
            debug!(job_id = %id, "Job not started: {}", e);
            return;
        }

        let reporter = ProgressReporter::new(self.store.clone(), id.clone(), self.config.bands);
        if let Err(e) = reporter.staged() {
            debug!(job_id = %id, "Staging progress not recorded: {}", e);
        }

        let (sink, rx) = progress_channel(self.config.channel_capacity);
        let (outcome, ()) = tokio::join!(
            self.router.dispatch(
                &job.input_file,
                &job.input_format,
                &job.output_format,
                &job.options,
                sink,
            ),
            reporter.pump(rx),
        );

        match outcome {
            Ok(output) => {
                if let Err(e) = reporter.finishing() {
                    debug!(job_id = %id, "Finishing progress not recorded: {}", e);
                }
                let result = self.store.succeed(id, output);
                self.finish(result, category, "success", started);
            }
            Err(e) => {
                let result = self.store.fail(id, e.to_string());
                self.finish(result, category, e.kind(), started);
            }
        }
    }

    /// Records the terminal transition, if the store accepted it.
    ///
    /// History is fire-and-forget: a full channel drops the record.
    fn finish(
        &self,
        result: Result<ConversionJob, crate::job::JobError>,
        category: FormatCategory,
        outcome: &str,
        started: Instant,
    ) {
        let job = match result {
            Ok(job) => job,
            Err(e) => {
                debug!("Discarding late result: {}", e);
                return;
            }
        };

        metrics::CONVERSIONS_TOTAL
            .with_label_values(&[category.as_str(), outcome])
            .inc();
        metrics::CONVERSION_DURATION
            .with_label_values(&[category.as_str()])
            .observe(started.elapsed().as_secs_f64());

        if let (Some(history), Some(record)) =
            (&self.history, HistoryRecord::from_job(&job, self.store.now()))
        {
            history.try_emit(record);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::{create_history_system, HistorySink, MemoryHistory};
    use crate::job::JobEvent;
    use crate::request::InputFile;
    use crate::testing::{fixtures, MockBackend};
    use std::time::Duration;

    #[tokio::test]
    async fn test_start_conversion_completes_job() {
        let backend = Arc::new(MockBackend::new());
        backend.set_progress_steps(vec![10, 50, 100]);
        let orchestrator = fixtures::orchestrator(backend.clone());

        let id = orchestrator
            .start_conversion(fixtures::request("photo.png", "jpg"))
            .await
            .unwrap();

        let job = orchestrator.store().get(&id).unwrap();
        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(job.progress, 100);
        assert_eq!(job.input_format, "png");
        assert!(job.result.is_some());
        assert!(job.error.is_none());
        assert!(job.completed_at.is_some());
        assert_eq!(backend.call_count(), 1);
    }

    #[tokio::test]
    async fn test_backend_rejection_is_stored_on_job() {
        let backend = Arc::new(MockBackend::new());
        backend.set_next_error("decode error");
        let orchestrator = fixtures::orchestrator(backend);

        let id = orchestrator
            .start_conversion(fixtures::request("a.png", "webp"))
            .await
            .unwrap();

        let job = orchestrator.store().get(&id).unwrap();
        assert_eq!(job.status, JobStatus::Failed);
        assert_eq!(job.error.as_deref(), Some("decode error"));
        assert!(job.result.is_none());
    }

    #[tokio::test]
    async fn test_unsupported_conversion_fails_from_queued() {
        let backend = Arc::new(MockBackend::new());
        let orchestrator = fixtures::orchestrator(backend.clone());
        let mut events = orchestrator.store().events();

        let id = orchestrator
            .start_conversion(
                fixtures::request("a.heic", "xlsx").with_input_format("heic"),
            )
            .await
            .unwrap();

        let job = orchestrator.store().get(&id).unwrap();
        assert_eq!(job.status, JobStatus::Failed);
        assert_eq!(job.error.as_deref(), Some("Cannot convert heic to xlsx"));
        assert_eq!(backend.call_count(), 0);

        // created, then straight to failed
        let mut statuses = Vec::new();
        while let Ok(event) = events.try_recv() {
            match event {
                JobEvent::Created { job } | JobEvent::Updated { job } => statuses.push(job.status),
                JobEvent::Removed { .. } => {}
            }
        }
        assert_eq!(statuses, vec![JobStatus::Queued, JobStatus::Failed]);
    }

    #[tokio::test]
    async fn test_validation_error_creates_no_job() {
        let orchestrator = fixtures::orchestrator(Arc::new(MockBackend::new()));
        let request = ConversionRequest::new(InputFile::new("", vec![1u8]), "jpg");

        let err = orchestrator.start_conversion(request).await.unwrap_err();
        assert_eq!(err, ValidationError::EmptyFileName);
        assert!(orchestrator.store().is_empty());
    }

    #[tokio::test]
    async fn test_batch_runs_sequentially_and_continues_after_failure() {
        let backend = Arc::new(MockBackend::new());
        backend.fail_for_format("png", "decode error");
        let orchestrator = fixtures::orchestrator(backend.clone());

        let report = orchestrator
            .submit_batch(vec![
                fixtures::request("a.png", "jpg"),
                fixtures::request("b.xlsx", "csv"),
                ConversionRequest::new(InputFile::new(" ", vec![1u8]), "jpg"),
            ])
            .await;

        assert_eq!(report.jobs.len(), 2);
        assert_eq!(report.rejected.len(), 1);
        assert_eq!(report.rejected[0].index, 2);

        let first = orchestrator.store().get(&report.jobs[0]).unwrap();
        let second = orchestrator.store().get(&report.jobs[1]).unwrap();
        assert_eq!(first.status, JobStatus::Failed);
        assert_eq!(second.status, JobStatus::Completed);
        assert_eq!(second.input_format, "xlsx");
        assert!(!orchestrator.is_batch_in_progress());
    }

    #[tokio::test]
    async fn test_batch_flag_is_raised_while_running() {
        let backend = Arc::new(MockBackend::new());
        backend.set_delay(Duration::from_millis(50));
        let orchestrator = Arc::new(fixtures::orchestrator(backend));

        let accepted = orchestrator.spawn_batch(vec![
            fixtures::request("a.png", "jpg"),
            fixtures::request("b.png", "webp"),
        ]);
        assert_eq!(accepted.accepted, 2);

        // Raised on acceptance, before the background task has run
        assert!(orchestrator.is_batch_in_progress());
        assert!(orchestrator.status().in_progress);

        while orchestrator.is_batch_in_progress() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(orchestrator.store().completed_jobs().len(), 2);
    }

    #[tokio::test]
    async fn test_batch_flag_stays_raised_for_queued_batch() {
        let backend = Arc::new(MockBackend::new());
        backend.set_delay(Duration::from_millis(20));
        let orchestrator = Arc::new(fixtures::orchestrator(backend));

        orchestrator.spawn_batch(vec![fixtures::request("a.png", "jpg")]);
        orchestrator.spawn_batch(vec![fixtures::request("b.png", "jpg")]);

        // The flag may only drop once both batches are done
        loop {
            let busy = orchestrator.is_batch_in_progress();
            let done = orchestrator.store().completed_jobs().len();
            if !busy {
                assert_eq!(done, 2);
                break;
            }
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    }

    #[tokio::test]
    async fn test_empty_batch_clears_flag() {
        let orchestrator = fixtures::orchestrator(Arc::new(MockBackend::new()));

        let report = orchestrator.submit_batch(Vec::new()).await;
        assert!(report.jobs.is_empty());
        assert!(!orchestrator.is_batch_in_progress());
    }

    #[tokio::test]
    async fn test_full_history_channel_does_not_block_jobs() {
        let backend = Arc::new(MockBackend::new());
        let sink = Arc::new(MemoryHistory::new(10));
        // The writer is never started, so the channel fills after one record
        let (handle, _writer) =
            create_history_system(sink.clone() as Arc<dyn HistorySink>, 1);
        let orchestrator = BatchOrchestrator::new(
            OrchestratorConfig::default(),
            JobStore::new(),
            fixtures::router(backend),
            Some(handle),
        );

        let report = tokio::time::timeout(
            Duration::from_secs(1),
            orchestrator.submit_batch(vec![
                fixtures::request("a.png", "jpg"),
                fixtures::request("b.png", "jpg"),
                fixtures::request("c.png", "jpg"),
            ]),
        )
        .await
        .expect("batch blocked on history");
        assert_eq!(report.jobs.len(), 3);
        assert_eq!(orchestrator.store().completed_jobs().len(), 3);
    }

    #[tokio::test]
    async fn test_retry_replaces_failed_job() {
        let backend = Arc::new(MockBackend::new());
        backend.set_next_error("decode error");
        let orchestrator = fixtures::orchestrator(backend);

        let failed = orchestrator
            .start_conversion(fixtures::request("a.png", "webp"))
            .await
            .unwrap();
        let retried = orchestrator.retry(&failed).await.unwrap();

        assert_ne!(failed, retried);
        assert!(orchestrator.store().get(&failed).is_none());
        let job = orchestrator.store().get(&retried).unwrap();
        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(job.output_format, "webp");

        let err = orchestrator.retry(&retried).await.unwrap_err();
        assert!(matches!(err, OrchestratorError::NotRetryable { .. }));
        let err = orchestrator.retry(&failed).await.unwrap_err();
        assert!(matches!(err, OrchestratorError::JobNotFound(_)));
    }

    #[tokio::test]
    async fn test_history_recorded_for_terminal_jobs() {
        let backend = Arc::new(MockBackend::new());
        backend.fail_for_format("webp", "decode error");
        let sink = Arc::new(MemoryHistory::new(10));
        let (handle, writer) = create_history_system(sink.clone(), 10);
        let writer_task = tokio::spawn(writer.run());

        let orchestrator = BatchOrchestrator::new(
            OrchestratorConfig::default(),
            JobStore::new(),
            fixtures::router(backend),
            Some(handle),
        );
        orchestrator
            .submit_batch(vec![
                fixtures::request("a.png", "jpg"),
                fixtures::request("b.png", "webp"),
            ])
            .await;
        drop(orchestrator);
        writer_task.await.unwrap();

        let records = sink.recent(10).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].input_name, "b.png");
        assert!(!records[0].success);
        assert_eq!(records[0].error.as_deref(), Some("decode error"));
        assert!(records[1].success);
    }

    #[tokio::test]
    async fn test_removed_job_is_not_finished() {
        let backend = Arc::new(MockBackend::new());
        backend.set_delay(Duration::from_millis(50));
        backend.set_progress_steps(vec![30, 60, 90]);
        let orchestrator = Arc::new(fixtures::orchestrator(backend));

        let id = orchestrator
            .spawn_conversion(fixtures::request("a.png", "jpg"))
            .unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(orchestrator.store().remove(&id).is_some());

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(orchestrator.store().get(&id).is_none());
        assert!(orchestrator.store().is_empty());
    }
}
