use parking_lot::Mutex;
use std::collections::VecDeque;
use thiserror::Error;

use super::HistoryRecord;

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("Storage error: {0}")]
    Storage(String),
}

/// Trait for history storage
pub trait HistorySink: Send + Sync {
    /// Store a record
    fn record(&self, record: &HistoryRecord) -> Result<(), HistoryError>;

    /// Most recent records, newest first
    fn recent(&self, limit: usize) -> Result<Vec<HistoryRecord>, HistoryError>;

    /// Remove every record
    fn clear(&self) -> Result<(), HistoryError>;
}

/// Keeps the most recent `capacity` records in memory.
pub struct MemoryHistory {
    records: Mutex<VecDeque<HistoryRecord>>,
    capacity: usize,
}

impl MemoryHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            records: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl HistorySink for MemoryHistory {
    fn record(&self, record: &HistoryRecord) -> Result<(), HistoryError> {
        if self.capacity == 0 {
            return Ok(());
        }
        let mut records = self.records.lock();
        while records.len() >= self.capacity {
            records.pop_front();
        }
        records.push_back(record.clone());
        Ok(())
    }

    fn recent(&self, limit: usize) -> Result<Vec<HistoryRecord>, HistoryError> {
        Ok(self
            .records
            .lock()
            .iter()
            .rev()
            .take(limit)
            .cloned()
            .collect())
    }

    fn clear(&self) -> Result<(), HistoryError> {
        self.records.lock().clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn record(id: &str) -> HistoryRecord {
        HistoryRecord {
            id: id.into(),
            input_name: format!("{}.png", id),
            input_format: "png".to_string(),
            output_format: "jpg".to_string(),
            timestamp: Utc::now(),
            file_size: 10,
            success: true,
            error: None,
        }
    }

    #[test]
    fn test_recent_is_newest_first() {
        let history = MemoryHistory::new(10);
        history.record(&record("a")).unwrap();
        history.record(&record("b")).unwrap();
        history.record(&record("c")).unwrap();

        let recent = history.recent(2).unwrap();
        let ids: Vec<_> = recent.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "b"]);
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let history = MemoryHistory::new(2);
        history.record(&record("a")).unwrap();
        history.record(&record("b")).unwrap();
        history.record(&record("c")).unwrap();

        assert_eq!(history.len(), 2);
        let ids: Vec<_> = history
            .recent(10)
            .unwrap()
            .into_iter()
            .map(|r| r.id.to_string())
            .collect();
        assert_eq!(ids, vec!["c", "b"]);
    }

    #[test]
    fn test_clear() {
        let history = MemoryHistory::new(5);
        history.record(&record("a")).unwrap();
        history.clear().unwrap();
        assert!(history.is_empty());
    }
}
