//! Store-facing end of a per-job progress channel.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::job::{JobError, JobId, JobStore};

/// Fixed progress bands.
///
/// `0..staging` covers staging the input, `staging..work_end` the backend's
/// own 0-100, and `work_end..100` cleanup. 100 is only reached on success.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressBands {
    pub staging: u8,
    pub work_end: u8,
}

impl Default for ProgressBands {
    fn default() -> Self {
        Self {
            staging: 10,
            work_end: 95,
        }
    }
}

impl ProgressBands {
    /// Maps a raw backend percentage into the work band.
    pub fn map(&self, raw: u8) -> u8 {
        let raw = u32::from(raw.min(100));
        let span = u32::from(self.work_end.saturating_sub(self.staging));
        let mapped = u32::from(self.staging) + raw * span / 100;
        mapped.min(u32::from(self.work_end)) as u8
    }
}

/// Feeds one job's progress into the [`JobStore`].
pub struct ProgressReporter {
    store: JobStore,
    job_id: JobId,
    bands: ProgressBands,
}

impl ProgressReporter {
    pub fn new(store: JobStore, job_id: JobId, bands: ProgressBands) -> Self {
        Self {
            store,
            job_id,
            bands,
        }
    }

    pub fn bands(&self) -> ProgressBands {
        self.bands
    }

    /// Marks the input as staged.
    pub fn staged(&self) -> Result<bool, JobError> {
        self.store.report_progress(&self.job_id, self.bands.staging)
    }

    /// Marks backend work as done, before cleanup and completion.
    pub fn finishing(&self) -> Result<bool, JobError> {
        self.store.report_progress(&self.job_id, self.bands.work_end)
    }

    /// Drains raw backend progress into the store until every sender is gone.
    ///
    /// Stops as soon as the job no longer exists. Dropping the receiver then
    /// closes the channel, so nothing the backend sends afterwards reaches the
    /// store.
    pub async fn pump(&self, mut rx: mpsc::Receiver<u8>) {
        while let Some(raw) = rx.recv().await {
            match self.store.report_progress(&self.job_id, self.bands.map(raw)) {
                Ok(_) => {}
                Err(JobError::NotFound(_)) => {
                    debug!(job_id = %self.job_id, "Job removed, discarding further progress");
                    break;
                }
                Err(e) => {
                    warn!(job_id = %self.job_id, "Failed to record progress: {}", e);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::progress_channel;
    use crate::request::{ConversionOptions, InputFile};

    #[test]
    fn test_band_mapping() {
        let bands = ProgressBands::default();
        assert_eq!(bands.map(0), 10);
        assert_eq!(bands.map(50), 52);
        assert_eq!(bands.map(100), 95);
        assert_eq!(bands.map(200), 95);
    }

    #[test]
    fn test_band_mapping_is_monotonic() {
        let bands = ProgressBands {
            staging: 5,
            work_end: 90,
        };
        let mut last = 0;
        for raw in 0..=100u8 {
            let mapped = bands.map(raw);
            assert!(mapped >= last);
            last = mapped;
        }
    }

    fn processing_job(store: &JobStore) -> JobId {
        let id = store.create(
            InputFile::new("a.wav", vec![0u8; 8]),
            "wav",
            "mp3",
            ConversionOptions::default(),
        );
        store.begin(&id).unwrap();
        id
    }

    #[tokio::test]
    async fn test_pump_maps_into_store() {
        let store = JobStore::new();
        let id = processing_job(&store);
        let reporter = ProgressReporter::new(store.clone(), id.clone(), ProgressBands::default());

        reporter.staged().unwrap();
        assert_eq!(store.get(&id).unwrap().progress, 10);

        let (sink, rx) = progress_channel(8);
        sink.report(50);
        sink.report(100);
        drop(sink);
        reporter.pump(rx).await;

        assert_eq!(store.get(&id).unwrap().progress, 95);
    }

    #[tokio::test]
    async fn test_pump_stops_after_removal() {
        let store = JobStore::new();
        let id = processing_job(&store);
        let reporter = ProgressReporter::new(store.clone(), id.clone(), ProgressBands::default());

        let (sink, rx) = progress_channel(8);
        store.remove(&id);
        sink.report(30);

        reporter.pump(rx).await;
        assert!(sink.is_closed());
        assert!(!sink.report(60));
        assert!(store.get(&id).is_none());
    }
}
