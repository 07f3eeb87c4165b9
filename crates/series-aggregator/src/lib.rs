//! Multi-Resolution Telemetry History
//!
//! Samples selected channels of the telemetry state on a time gate and keeps
//! three circular histories per channel: the raw samples, averages of N₁
//! samples, and averages of N₂ of those. Every finalized point is forwarded
//! to a [`storage::SampleSink`].

mod aggregator;
mod channel;
mod config;
mod error;

pub use aggregator::{Aggregator, SessionStats, StoreOutcome};
pub use channel::{Channel, Horizon};
pub use config::{AggregatorConfig, SeriesConfig};
pub use error::AggregatorError;
