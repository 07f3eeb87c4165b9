//! Fixed-Capacity Sample Series
//!
//! Provides the circular sample store used for each time horizon, plus the
//! running-average accumulator that feeds a coarser horizon from a finer one.

mod accumulator;
mod buffer;

pub use accumulator::Accumulator;
pub use buffer::SeriesBuffer;
