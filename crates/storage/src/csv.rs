//! CSV Directory Sink
//!
//! One append-only file per series, `<channel>_<horizon>.csv`, with an
//! `ms,value` header written when the file is empty.

use crate::{SampleRecord, SampleSink, StorageError};
use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const HEADER: &str = "ms,value";

/// Appends samples as CSV rows under a directory
pub struct CsvSink {
    dir: PathBuf,
    files: HashMap<String, File>,
}

impl CsvSink {
    /// Use `dir` as the log directory, creating it if needed
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, StorageError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).map_err(|source| StorageError::Io {
            path: dir.display().to_string(),
            source,
        })?;
        info!("Logging samples to {}", dir.display());
        Ok(Self {
            dir,
            files: HashMap::new(),
        })
    }

    /// Path of the file holding one series
    pub fn path_for(&self, channel: &str, horizon: &str) -> PathBuf {
        self.dir.join(format!("{}_{}.csv", channel, horizon))
    }

    fn file_for(&mut self, channel: &str, horizon: &str) -> Result<&mut File, StorageError> {
        let key = format!("{}_{}", channel, horizon);
        if !self.files.contains_key(&key) {
            let path = self.path_for(channel, horizon);
            let io_err = |source| StorageError::Io {
                path: path.display().to_string(),
                source,
            };
            let mut file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .map_err(io_err)?;
            if file.metadata().map_err(io_err)?.len() == 0 {
                writeln!(file, "{}", HEADER).map_err(io_err)?;
            }
            debug!("Opened series log {}", path.display());
            self.files.insert(key.clone(), file);
        }
        self.files
            .get_mut(&key)
            .ok_or_else(|| StorageError::Unavailable(key))
    }
}

impl SampleSink for CsvSink {
    /// Append one row.
    ///
    /// Writes go straight to `std::fs` and block the calling thread. A failed
    /// series is reopened on its next append.
    fn append(&mut self, record: &SampleRecord<'_>) -> Result<(), StorageError> {
        let file = self.file_for(record.channel, record.horizon)?;
        if let Err(source) = writeln!(file, "{},{:.3}", record.timestamp_ms, record.value) {
            self.files
                .remove(&format!("{}_{}", record.channel, record.horizon));
            return Err(StorageError::Io {
                path: self
                    .path_for(record.channel, record.horizon)
                    .display()
                    .to_string(),
                source,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(channel: &'static str, ts: u64, value: f64) -> SampleRecord<'static> {
        SampleRecord {
            channel,
            horizon: "fine",
            timestamp_ms: ts,
            value,
        }
    }

    #[test]
    fn test_appends_rows_with_header() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = CsvSink::open(dir.path()).unwrap();
        sink.append(&sample("battery_voltage", 1000, 12.6)).unwrap();
        sink.append(&sample("battery_voltage", 11000, 12.55)).unwrap();

        let contents = fs::read_to_string(sink.path_for("battery_voltage", "fine")).unwrap();
        assert_eq!(contents, "ms,value\n1000,12.600\n11000,12.550\n");
    }

    #[test]
    fn test_existing_file_not_given_second_header() {
        let dir = tempfile::tempdir().unwrap();
        {
            let mut sink = CsvSink::open(dir.path()).unwrap();
            sink.append(&sample("rpm", 1, 800.0)).unwrap();
        }
        let mut sink = CsvSink::open(dir.path()).unwrap();
        sink.append(&sample("rpm", 2, 900.0)).unwrap();

        let contents = fs::read_to_string(sink.path_for("rpm", "fine")).unwrap();
        assert_eq!(contents.matches(HEADER).count(), 1);
        assert_eq!(contents.lines().count(), 3);
    }

    #[test]
    fn test_missing_directory_reports_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = CsvSink::open(dir.path().join("logs")).unwrap();
        fs::remove_dir_all(dir.path().join("logs")).unwrap();

        let err = sink.append(&sample("heading", 1, 10.0)).unwrap_err();
        assert!(matches!(err, StorageError::Io { .. }));
    }

    #[test]
    fn test_recovers_when_directory_returns() {
        let dir = tempfile::tempdir().unwrap();
        let logs = dir.path().join("logs");
        let mut sink = CsvSink::open(&logs).unwrap();
        fs::remove_dir_all(&logs).unwrap();
        assert!(sink.append(&sample("heading", 1, 10.0)).is_err());

        fs::create_dir_all(&logs).unwrap();
        sink.append(&sample("heading", 2, 20.0)).unwrap();

        let contents = fs::read_to_string(sink.path_for("heading", "fine")).unwrap();
        assert_eq!(contents, "ms,value\n2,20.000\n");
    }
}
