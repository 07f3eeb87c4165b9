//! Aggregator Error Types

use thiserror::Error;

/// Errors raised while building an aggregator
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AggregatorError {
    /// A configuration value that must be positive was zero
    #[error("{0} must be greater than zero")]
    ZeroValue(&'static str),

    /// The same channel was listed twice
    #[error("Channel {0} configured more than once")]
    DuplicateChannel(&'static str),
}
