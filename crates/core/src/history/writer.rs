use std::sync::Arc;

use tokio::sync::mpsc;

use super::{HistoryHandle, HistoryRecord, HistorySink};

/// Background task that receives history records and writes them to a sink
pub struct HistoryWriter {
    rx: mpsc::Receiver<HistoryRecord>,
    sink: Arc<dyn HistorySink>,
}

impl HistoryWriter {
    /// Create a new history writer
    pub fn new(rx: mpsc::Receiver<HistoryRecord>, sink: Arc<dyn HistorySink>) -> Self {
        Self { rx, sink }
    }

    /// Run the writer, consuming records until every handle is dropped
    ///
    /// This should be spawned as a background task.
    pub async fn run(mut self) {
        tracing::info!("History writer started");

        while let Some(record) = self.rx.recv().await {
            if let Err(e) = self.sink.record(&record) {
                tracing::error!(job_id = %record.id, "Failed to write history record: {}", e);
            }
        }

        tracing::info!("History writer shutting down");
    }
}

/// Create a complete history system
///
/// Returns:
/// - `HistoryHandle` - for emitting records (clone this to share across tasks)
/// - `HistoryWriter` - spawn this as a background task with `tokio::spawn(writer.run())`
pub fn create_history_system(
    sink: Arc<dyn HistorySink>,
    buffer_size: usize,
) -> (HistoryHandle, HistoryWriter) {
    let (tx, rx) = mpsc::channel(buffer_size.max(1));
    let handle = HistoryHandle::new(tx);
    let writer = HistoryWriter::new(rx, sink);
    (handle, writer)
}
