//! In-memory job store.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::{broadcast, watch};
use tracing::{debug, info, warn};

use super::error::JobError;
use super::estimate::{initial_estimate_ms, remaining_ms};
use super::types::{ConversionJob, JobEvent, JobId, JobStatus};
use crate::backend::ConversionOutput;
use crate::clock::{Clock, SystemClock};
use crate::format::{normalize_extension, FormatRegistry};
use crate::request::{ConversionOptions, InputFile};

const EVENT_CAPACITY: usize = 256;

/// Snapshot of every job, in creation order.
pub type JobSnapshot = Arc<Vec<ConversionJob>>;

struct Inner {
    jobs: Mutex<Vec<ConversionJob>>,
    snapshots: watch::Sender<JobSnapshot>,
    events: broadcast::Sender<JobEvent>,
    clock: Arc<dyn Clock>,
    registry: FormatRegistry,
}

/// Owner of every [`ConversionJob`].
///
/// Jobs only change through the transition methods below. Each transition
/// is applied and published to subscribers under one lock, so subscribers
/// never observe a half-applied change. Cloning the store yields another
/// handle to the same jobs.
#[derive(Clone)]
pub struct JobStore {
    inner: Arc<Inner>,
}

impl Default for JobStore {
    fn default() -> Self {
        Self::new()
    }
}

impl JobStore {
    /// Creates an empty store using the system clock.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Creates an empty store with a custom clock.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        let (snapshots, _) = watch::channel(Arc::new(Vec::new()));
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                jobs: Mutex::new(Vec::new()),
                snapshots,
                events,
                clock,
                registry: FormatRegistry::new(),
            }),
        }
    }

    /// Current time according to the store's clock.
    pub fn now(&self) -> DateTime<Utc> {
        self.inner.clock.now()
    }

    /// Subscribes to full snapshots. The receiver always holds the latest one.
    pub fn subscribe(&self) -> watch::Receiver<JobSnapshot> {
        self.inner.snapshots.subscribe()
    }

    /// Subscribes to per-job change events.
    pub fn events(&self) -> broadcast::Receiver<JobEvent> {
        self.inner.events.subscribe()
    }

    fn publish(&self, jobs: &[ConversionJob], events: impl IntoIterator<Item = JobEvent>) {
        self.inner.snapshots.send_replace(Arc::new(jobs.to_vec()));
        for event in events {
            // No receivers is fine
            let _ = self.inner.events.send(event);
        }
    }

    /// Creates a queued job and returns its id.
    pub fn create(
        &self,
        input_file: InputFile,
        input_format: &str,
        output_format: &str,
        options: ConversionOptions,
    ) -> JobId {
        let input_format = normalize_extension(input_format);
        let output_format = normalize_extension(output_format);
        let category = self.inner.registry.category_of(&input_format);
        let estimate = initial_estimate_ms(
            input_file.size(),
            category,
            &input_format,
            &output_format,
        );

        let job = ConversionJob {
            id: JobId::generate(),
            input_file,
            input_format,
            output_format,
            options,
            status: JobStatus::Queued,
            progress: 0,
            result: None,
            error: None,
            created_at: self.now(),
            started_at: None,
            completed_at: None,
            estimated_time_remaining_ms: Some(estimate),
        };
        let id = job.id.clone();

        info!(
            job_id = %id,
            input_format = %job.input_format,
            output_format = %job.output_format,
            category = %category,
            size = job.input_file.size(),
            "Job created"
        );

        let mut jobs = self.inner.jobs.lock();
        let event = JobEvent::Created { job: job.summary() };
        jobs.push(job);
        self.publish(&jobs, [event]);

        id
    }

    /// Applies `f` to job `id` if its status is one of `allowed`.
    fn transition<F>(
        &self,
        id: &JobId,
        action: &'static str,
        allowed: &[JobStatus],
        f: F,
    ) -> Result<ConversionJob, JobError>
    where
        F: FnOnce(&mut ConversionJob, DateTime<Utc>),
    {
        let now = self.now();
        let mut jobs = self.inner.jobs.lock();
        let job = jobs
            .iter_mut()
            .find(|j| &j.id == id)
            .ok_or_else(|| JobError::NotFound(id.clone()))?;

        if !allowed.contains(&job.status) {
            warn!(job_id = %id, status = %job.status, action, "Rejected job transition");
            return Err(JobError::InvalidTransition {
                id: id.clone(),
                status: job.status,
                action,
            });
        }

        f(job, now);
        let updated = job.clone();
        self.publish(&jobs, [JobEvent::Updated { job: updated.summary() }]);
        Ok(updated)
    }

    /// `queued -> processing`.
    pub fn begin(&self, id: &JobId) -> Result<ConversionJob, JobError> {
        let job = self.transition(id, "begin", &[JobStatus::Queued], |job, now| {
            job.status = JobStatus::Processing;
            job.started_at = Some(now);
        })?;
        debug!(job_id = %id, "Job processing");
        Ok(job)
    }

    /// Records progress for a processing job.
    ///
    /// Progress never decreases and is capped at 100. Returns `Ok(false)` when
    /// the update changed nothing or the job is not processing.
    pub fn report_progress(&self, id: &JobId, percent: u8) -> Result<bool, JobError> {
        let now = self.now();
        let mut jobs = self.inner.jobs.lock();
        let job = jobs
            .iter_mut()
            .find(|j| &j.id == id)
            .ok_or_else(|| JobError::NotFound(id.clone()))?;

        if job.status != JobStatus::Processing {
            debug!(job_id = %id, status = %job.status, "Ignoring progress for job not processing");
            return Ok(false);
        }

        let percent = percent.min(100).max(job.progress);
        if percent == job.progress {
            return Ok(false);
        }

        job.progress = percent;
        if let Some(started_at) = job.started_at {
            job.estimated_time_remaining_ms = remaining_ms(started_at, now, percent);
        }
        debug!(job_id = %id, progress = percent, "Job progress");

        let event = JobEvent::Updated { job: job.summary() };
        self.publish(&jobs, [event]);
        Ok(true)
    }

    /// `processing -> completed`.
    pub fn succeed(&self, id: &JobId, result: ConversionOutput) -> Result<ConversionJob, JobError> {
        let outputs = result.len();
        let job = self.transition(id, "complete", &[JobStatus::Processing], |job, now| {
            job.status = JobStatus::Completed;
            job.progress = 100;
            job.result = Some(result);
            job.error = None;
            job.estimated_time_remaining_ms = Some(0);
            if job.completed_at.is_none() {
                job.completed_at = Some(now);
            }
        })?;
        info!(job_id = %id, outputs, "Job completed");
        Ok(job)
    }

    /// `processing -> failed`, or `queued -> failed` when dispatch fails
    /// before the job starts.
    pub fn fail(&self, id: &JobId, error: impl Into<String>) -> Result<ConversionJob, JobError> {
        let error = error.into();
        let message = error.clone();
        let job = self.transition(
            id,
            "fail",
            &[JobStatus::Queued, JobStatus::Processing],
            |job, _| {
                job.status = JobStatus::Failed;
                job.result = None;
                job.error = Some(error);
                job.estimated_time_remaining_ms = None;
            },
        )?;
        info!(job_id = %id, error = %message, "Job failed");
        Ok(job)
    }

    /// Removes a job in any state. Late updates for it become no-ops.
    pub fn remove(&self, id: &JobId) -> Option<ConversionJob> {
        let mut jobs = self.inner.jobs.lock();
        let index = jobs.iter().position(|j| &j.id == id)?;
        let removed = jobs.remove(index);
        self.publish(&jobs, [JobEvent::Removed { id: id.clone() }]);
        debug!(job_id = %id, status = %removed.status, "Job removed");
        Some(removed)
    }

    /// Removes jobs matching `predicate` in one notification.
    fn remove_where<P>(&self, predicate: P) -> Vec<JobId>
    where
        P: Fn(&ConversionJob) -> bool,
    {
        let mut jobs = self.inner.jobs.lock();
        let removed: Vec<JobId> = jobs
            .iter()
            .filter(|&j| predicate(j))
            .map(|j| j.id.clone())
            .collect();
        if removed.is_empty() {
            return removed;
        }
        jobs.retain(|j| !predicate(j));
        self.publish(
            &jobs,
            removed.iter().map(|id| JobEvent::Removed { id: id.clone() }),
        );
        removed
    }

    /// Removes every completed job. Returns their ids.
    pub fn clear_completed(&self) -> Vec<JobId> {
        let removed = self.remove_where(|j| j.status == JobStatus::Completed);
        if !removed.is_empty() {
            info!(count = removed.len(), "Cleared completed jobs");
        }
        removed
    }

    /// Removes completed jobs whose `completed_at` is at or before `cutoff`.
    pub fn remove_completed_before(&self, cutoff: DateTime<Utc>) -> Vec<JobId> {
        self.remove_where(|j| {
            j.status == JobStatus::Completed && j.completed_at.is_some_and(|at| at <= cutoff)
        })
    }

    pub fn get(&self, id: &JobId) -> Option<ConversionJob> {
        self.inner.jobs.lock().iter().find(|j| &j.id == id).cloned()
    }

    /// All jobs in creation order.
    pub fn list(&self) -> Vec<ConversionJob> {
        self.inner.jobs.lock().clone()
    }

    fn filtered(&self, predicate: impl Fn(&ConversionJob) -> bool) -> Vec<ConversionJob> {
        self.inner
            .jobs
            .lock()
            .iter()
            .filter(|&j| predicate(j))
            .cloned()
            .collect()
    }

    pub fn completed_jobs(&self) -> Vec<ConversionJob> {
        self.filtered(|j| j.status == JobStatus::Completed)
    }

    /// Queued or processing jobs.
    pub fn pending_jobs(&self) -> Vec<ConversionJob> {
        self.filtered(|j| matches!(j.status, JobStatus::Queued | JobStatus::Processing))
    }

    pub fn failed_jobs(&self) -> Vec<ConversionJob> {
        self.filtered(|j| j.status == JobStatus::Failed)
    }

    pub fn len(&self) -> usize {
        self.inner.jobs.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
