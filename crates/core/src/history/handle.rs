use tokio::sync::mpsc;

use super::HistoryRecord;

/// Handle for emitting history records
///
/// This is cheaply cloneable and can be shared across tasks.
/// Records are sent through a channel to be written by the HistoryWriter.
#[derive(Clone)]
pub struct HistoryHandle {
    tx: mpsc::Sender<HistoryRecord>,
}

impl HistoryHandle {
    /// Create a new history handle from a channel sender
    pub fn new(tx: mpsc::Sender<HistoryRecord>) -> Self {
        Self { tx }
    }

    /// Emit a record, waiting for channel capacity
    ///
    /// If the channel is closed, the error is logged but the caller is not failed.
    pub async fn emit(&self, record: HistoryRecord) {
        if let Err(e) = self.tx.send(record).await {
            tracing::error!(job_id = %e.0.id, "Failed to emit history record: channel closed");
        }
    }

    /// Try to emit a record without waiting
    ///
    /// Returns true if the record was sent successfully, false otherwise.
    pub fn try_emit(&self, record: HistoryRecord) -> bool {
        match self.tx.try_send(record) {
            Ok(()) => true,
            Err(e) => {
                tracing::error!("Failed to emit history record: {}", e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn record(id: &str, success: bool) -> HistoryRecord {
        HistoryRecord {
            id: id.into(),
            input_name: "a.png".to_string(),
            input_format: "png".to_string(),
            output_format: "jpg".to_string(),
            timestamp: Utc::now(),
            file_size: 1,
            success,
            error: None,
        }
    }

    #[tokio::test]
    async fn test_emit_record() {
        let (tx, mut rx) = mpsc::channel(10);
        let handle = HistoryHandle::new(tx);

        handle.emit(record("j1", true)).await;

        let received = rx.recv().await.expect("Should receive record");
        assert_eq!(received.id.as_str(), "j1");
    }

    #[test]
    fn test_try_emit_full_channel() {
        let (tx, _rx) = mpsc::channel(1);
        let handle = HistoryHandle::new(tx);

        assert!(handle.try_emit(record("j1", true)));
        // Channel full
        assert!(!handle.try_emit(record("j2", false)));
    }

    #[tokio::test]
    async fn test_emit_closed_channel() {
        let (tx, rx) = mpsc::channel::<HistoryRecord>(10);
        let handle = HistoryHandle::new(tx);
        drop(rx);

        // Should not panic, just log an error
        handle.emit(record("j1", true)).await;
        assert!(!handle.try_emit(record("j2", true)));
    }
}
