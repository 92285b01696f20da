//! Background eviction of old completed jobs.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::job::{JobId, JobStore};
use crate::metrics;

use super::settings::RetentionControl;

/// Removes completed jobs once they are older than the retention window.
///
/// Failed, queued and processing jobs are never touched.
pub struct RetentionSweeper {
    store: JobStore,
    control: RetentionControl,
    interval: Duration,

    // Runtime state
    running: Arc<AtomicBool>,
    shutdown_tx: broadcast::Sender<()>,
}

impl RetentionSweeper {
    pub fn new(store: JobStore, control: RetentionControl, interval: Duration) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        Self {
            store,
            control,
            interval,
            running: Arc::new(AtomicBool::new(false)),
            shutdown_tx,
        }
    }

    pub fn control(&self) -> &RetentionControl {
        &self.control
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// Runs one sweep against the store's clock. Returns the evicted ids.
    pub fn sweep_once(&self) -> Vec<JobId> {
        Self::sweep(&self.store, &self.control)
    }

    fn sweep(store: &JobStore, control: &RetentionControl) -> Vec<JobId> {
        let settings = control.get();
        if !settings.enabled {
            return Vec::new();
        }

        let cutoff = store.now() - settings.window();
        let evicted = store.remove_completed_before(cutoff);
        if !evicted.is_empty() {
            metrics::RETENTION_EVICTIONS.inc_by(evicted.len() as u64);
            info!(
                count = evicted.len(),
                window_minutes = settings.window_minutes,
                "Evicted completed jobs"
            );
        }
        evicted
    }

    /// Start the sweep loop (spawns a background task).
    pub fn start(&self) {
        if self.running.swap(true, Ordering::SeqCst) {
            warn!("Retention sweeper already running");
            return;
        }

        let running = Arc::clone(&self.running);
        let store = self.store.clone();
        let control = self.control.clone();
        let period = self.interval;
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        tokio::spawn(async move {
            info!(interval_secs = period.as_secs(), "Retention sweeper started");
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => {
                        info!("Retention sweeper received shutdown signal");
                        break;
                    }
                    _ = ticker.tick() => {
                        if !running.load(Ordering::Relaxed) {
                            break;
                        }
                        let evicted = Self::sweep(&store, &control);
                        debug!(evicted = evicted.len(), "Retention sweep done");
                    }
                }
            }
            info!("Retention sweeper stopped");
        });
    }

    /// Stop the sweep loop.
    pub fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            warn!("Retention sweeper not running");
            return;
        }
        let _ = self.shutdown_tx.send(());
    }
}

impl Drop for RetentionSweeper {
    fn drop(&mut self) {
        if self.running.swap(false, Ordering::SeqCst) {
            let _ = self.shutdown_tx.send(());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{ConversionOutput, OutputFile};
    use crate::request::{ConversionOptions, InputFile};
    use crate::retention::RetentionSettings;
    use crate::testing::ManualClock;
    use chrono::Duration as ChronoDuration;

    fn completed_job(store: &JobStore) -> JobId {
        let id = store.create(
            InputFile::new("a.png", vec![1u8]),
            "png",
            "jpg",
            ConversionOptions::default(),
        );
        store.begin(&id).unwrap();
        store
            .succeed(&id, ConversionOutput::Single(OutputFile::new("a.jpg", "image/jpeg", vec![2u8])))
            .unwrap();
        id
    }

    fn failed_job(store: &JobStore) -> JobId {
        let id = store.create(
            InputFile::new("b.png", vec![1u8]),
            "png",
            "jpg",
            ConversionOptions::default(),
        );
        store.begin(&id).unwrap();
        store.fail(&id, "decode error").unwrap();
        id
    }

    fn setup() -> (Arc<ManualClock>, JobStore, RetentionSweeper) {
        let clock = Arc::new(ManualClock::default());
        let store = JobStore::with_clock(clock.clone());
        let sweeper = RetentionSweeper::new(
            store.clone(),
            RetentionControl::new(RetentionSettings::default()),
            Duration::from_secs(30),
        );
        (clock, store, sweeper)
    }

    #[test]
    fn test_evicts_exactly_at_window() {
        let (clock, store, sweeper) = setup();
        let completed = completed_job(&store);
        let failed = failed_job(&store);

        clock.advance(ChronoDuration::minutes(5) - ChronoDuration::seconds(1));
        assert!(sweeper.sweep_once().is_empty());

        clock.advance(ChronoDuration::seconds(1));
        assert_eq!(sweeper.sweep_once(), vec![completed]);

        clock.advance(ChronoDuration::hours(1));
        assert!(sweeper.sweep_once().is_empty());
        assert!(store.get(&failed).is_some());
    }

    #[test]
    fn test_disabled_retention_keeps_everything() {
        let (clock, store, sweeper) = setup();
        let id = completed_job(&store);
        sweeper.control().set_enabled(false);

        clock.advance(ChronoDuration::hours(1));
        assert!(sweeper.sweep_once().is_empty());
        assert!(store.get(&id).is_some());

        sweeper.control().set_enabled(true);
        assert_eq!(sweeper.sweep_once(), vec![id]);
    }

    #[test]
    fn test_pending_jobs_untouched() {
        let (clock, store, sweeper) = setup();
        let queued = store.create(
            InputFile::new("c.png", vec![1u8]),
            "png",
            "jpg",
            ConversionOptions::default(),
        );

        clock.advance(ChronoDuration::hours(1));
        assert!(sweeper.sweep_once().is_empty());
        assert!(store.get(&queued).is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_loop_sweeps_on_interval() {
        let (clock, store, sweeper) = setup();
        let id = completed_job(&store);
        clock.advance(ChronoDuration::minutes(10));

        sweeper.start();
        assert!(sweeper.is_running());
        tokio::time::sleep(Duration::from_secs(31)).await;

        assert!(store.get(&id).is_none());
        sweeper.stop();
        assert!(!sweeper.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_window_change_applies_next_tick() {
        let (clock, store, sweeper) = setup();
        let id = completed_job(&store);
        clock.advance(ChronoDuration::minutes(3));

        sweeper.start();
        tokio::time::sleep(Duration::from_secs(31)).await;
        assert!(store.get(&id).is_some());

        sweeper.control().set_window_minutes(2).unwrap();
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert!(store.get(&id).is_none());
        sweeper.stop();
    }
}
