//! Backend-facing end of a per-job progress channel.

use tokio::sync::mpsc;
use tracing::trace;

/// Sender handed to a backend for one conversion.
///
/// Values are raw backend percentages (0-100). Sends never block: when the
/// channel is full the update is dropped, and once the job is gone the
/// receiving side closes and every further update is discarded.
#[derive(Debug, Clone)]
pub struct ProgressSink {
    tx: Option<mpsc::Sender<u8>>,
}

impl ProgressSink {
    pub fn new(tx: mpsc::Sender<u8>) -> Self {
        Self { tx: Some(tx) }
    }

    /// A sink that discards everything.
    pub fn noop() -> Self {
        Self { tx: None }
    }

    /// Reports a percentage, clamped to 100. Returns whether it was delivered.
    pub fn report(&self, percent: u8) -> bool {
        let Some(tx) = &self.tx else {
            return false;
        };
        match tx.try_send(percent.min(100)) {
            Ok(()) => true,
            Err(e) => {
                trace!("Progress update dropped: {}", e);
                false
            }
        }
    }

    /// Reports a fraction in `0.0..=1.0`.
    pub fn report_fraction(&self, fraction: f64) -> bool {
        let percent = (fraction.clamp(0.0, 1.0) * 100.0).floor() as u8;
        self.report(percent)
    }

    /// True once nobody listens anymore (the job was removed or finished).
    ///
    /// Long-running backends may poll this to stop early.
    pub fn is_closed(&self) -> bool {
        self.tx.as_ref().map_or(true, |tx| tx.is_closed())
    }
}

/// Creates a progress channel with the given capacity.
pub fn progress_channel(capacity: usize) -> (ProgressSink, mpsc::Receiver<u8>) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (ProgressSink::new(tx), rx)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_clamps() {
        let (sink, mut rx) = progress_channel(4);
        assert!(sink.report(150));
        assert_eq!(rx.try_recv().unwrap(), 100);
    }

    #[test]
    fn test_report_fraction() {
        let (sink, mut rx) = progress_channel(4);
        sink.report_fraction(0.5);
        sink.report_fraction(2.0);
        assert_eq!(rx.try_recv().unwrap(), 50);
        assert_eq!(rx.try_recv().unwrap(), 100);
    }

    #[test]
    fn test_full_channel_drops_update() {
        let (sink, _rx) = progress_channel(1);
        assert!(sink.report(10));
        assert!(!sink.report(20));
    }

    #[test]
    fn test_closed_after_receiver_dropped() {
        let (sink, rx) = progress_channel(4);
        assert!(!sink.is_closed());
        drop(rx);
        assert!(sink.is_closed());
        assert!(!sink.report(30));
    }

    #[test]
    fn test_noop_sink() {
        let sink = ProgressSink::noop();
        assert!(!sink.report(10));
        assert!(sink.is_closed());
    }
}
