//! In-Memory Repository

use crate::{SampleRecord, SampleSink, StorageError};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tracing::info;

/// Owned copy of a [`SampleRecord`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredSample {
    pub channel: String,
    pub horizon: String,
    pub timestamp_ms: u64,
    pub value: f64,
}

impl From<&SampleRecord<'_>> for StoredSample {
    fn from(record: &SampleRecord<'_>) -> Self {
        Self {
            channel: record.channel.to_string(),
            horizon: record.horizon.to_string(),
            timestamp_ms: record.timestamp_ms,
            value: record.value,
        }
    }
}

/// In-memory sample log with bounded retention
///
/// Shared through `Arc<Repository>`, so readers can query while the
/// aggregator appends.
pub struct Repository {
    /// Sample records, oldest first
    samples: Mutex<VecDeque<StoredSample>>,
    /// Max retained records
    max_records: usize,
}

impl Repository {
    /// Create a new in-memory repository
    pub fn new() -> Self {
        Self::with_retention(100_000)
    }

    /// Create a repository keeping at most `max_records` rows
    pub fn with_retention(max_records: usize) -> Self {
        info!("Creating in-memory sample repository ({} rows)", max_records);
        Self {
            samples: Mutex::new(VecDeque::with_capacity(max_records.min(10_000))),
            max_records: max_records.max(1),
        }
    }

    /// Insert a sample record
    pub fn insert(&self, record: StoredSample) -> Result<(), StorageError> {
        let mut log = self
            .samples
            .lock()
            .map_err(|e| StorageError::LockError(e.to_string()))?;

        // Enforce retention
        while log.len() >= self.max_records {
            log.pop_front();
        }

        log.push_back(record);
        Ok(())
    }

    /// Most recent rows of one series (most recent first)
    pub fn get_series(
        &self,
        channel: &str,
        horizon: &str,
        limit: usize,
    ) -> Result<Vec<StoredSample>, StorageError> {
        let log = self
            .samples
            .lock()
            .map_err(|e| StorageError::LockError(e.to_string()))?;

        Ok(log
            .iter()
            .rev()
            .filter(|s| s.channel == channel && s.horizon == horizon)
            .take(limit)
            .cloned()
            .collect())
    }

    /// Get total record count
    pub fn count(&self) -> usize {
        self.samples.lock().map(|l| l.len()).unwrap_or(0)
    }
}

impl Default for Repository {
    fn default() -> Self {
        Self::new()
    }
}

impl SampleSink for Repository {
    fn append(&mut self, record: &SampleRecord<'_>) -> Result<(), StorageError> {
        self.insert(record.into())
    }
}

impl SampleSink for Arc<Repository> {
    fn append(&mut self, record: &SampleRecord<'_>) -> Result<(), StorageError> {
        self.insert(record.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(channel: &str, horizon: &str, ts: u64, value: f64) -> StoredSample {
        StoredSample {
            channel: channel.to_string(),
            horizon: horizon.to_string(),
            timestamp_ms: ts,
            value,
        }
    }

    #[test]
    fn test_insert_and_query_series() {
        let repo = Repository::new();
        repo.insert(record("battery_voltage", "fine", 1000, 12.6)).unwrap();
        repo.insert(record("battery_voltage", "medium", 1000, 12.5)).unwrap();
        repo.insert(record("true_wind_speed", "fine", 1000, 4.2)).unwrap();
        repo.insert(record("battery_voltage", "fine", 2000, 12.7)).unwrap();

        let series = repo.get_series("battery_voltage", "fine", 10).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].value, 12.7);
    }

    #[test]
    fn test_retention_limit() {
        let repo = Repository::with_retention(5);

        for i in 0..10 {
            repo.insert(record("rpm", "fine", i, i as f64)).unwrap();
        }

        assert_eq!(repo.count(), 5);
        let series = repo.get_series("rpm", "fine", 10).unwrap();
        assert_eq!(series.len(), 5);
        assert_eq!(series[0].timestamp_ms, 9);
        assert_eq!(series[4].timestamp_ms, 5);
    }

    #[test]
    fn test_shared_sink_appends() {
        let repo = Arc::new(Repository::new());
        let mut sink = Arc::clone(&repo);
        sink.append(&SampleRecord {
            channel: "heading",
            horizon: "coarse",
            timestamp_ms: 42,
            value: 180.0,
        })
        .unwrap();
        assert_eq!(repo.count(), 1);
    }
}
