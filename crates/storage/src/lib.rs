//! Storage Layer
//!
//! Append-only sinks for finalized telemetry samples. The aggregator only
//! depends on [`SampleSink`]; a CSV directory and an in-memory repository
//! are provided.

mod csv;
mod repository;

pub use csv::CsvSink;
pub use repository::{Repository, StoredSample};

use serde::Serialize;
use thiserror::Error;

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
    #[error("Lock error: {0}")]
    LockError(String),
}

/// One finalized sample of one series
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SampleRecord<'a> {
    /// Channel name, e.g. `battery_voltage`
    pub channel: &'a str,
    /// Horizon label, e.g. `fine`
    pub horizon: &'a str,
    /// Monotonic timestamp (ms)
    pub timestamp_ms: u64,
    pub value: f64,
}

/// Append-only destination for samples
pub trait SampleSink {
    /// Append one row. Failures are reported, never retried.
    fn append(&mut self, record: &SampleRecord<'_>) -> Result<(), StorageError>;
}

impl<S: SampleSink + ?Sized> SampleSink for Box<S> {
    fn append(&mut self, record: &SampleRecord<'_>) -> Result<(), StorageError> {
        (**self).append(record)
    }
}

impl<S: SampleSink + ?Sized> SampleSink for &mut S {
    fn append(&mut self, record: &SampleRecord<'_>) -> Result<(), StorageError> {
        (**self).append(record)
    }
}

/// Sink that discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl SampleSink for NullSink {
    fn append(&mut self, _record: &SampleRecord<'_>) -> Result<(), StorageError> {
        Ok(())
    }
}
