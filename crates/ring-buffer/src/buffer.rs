//! Circular Series Buffer

use crate::accumulator::Accumulator;

/// Circular store of the most recent samples of one series
///
/// Storage is allocated once and never grows. `index` is the slot the next
/// sample goes to, which is also the oldest retained slot once the buffer
/// has wrapped.
#[derive(Debug, Clone)]
pub struct SeriesBuffer {
    /// Pre-allocated storage
    values: Box<[f64]>,
    /// Write position, always in `[0, capacity)`
    index: usize,
    /// Set once the write position has returned to 0; never cleared
    wrapped: bool,
    /// Running average feeding this buffer, for downsampled horizons
    accumulator: Option<Accumulator>,
    /// Total samples written (for statistics)
    total_written: u64,
}

impl SeriesBuffer {
    /// Create a buffer written to directly with [`SeriesBuffer::push`].
    ///
    /// A zero capacity is raised to 1.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            values: vec![0.0; capacity].into_boxed_slice(),
            index: 0,
            wrapped: false,
            accumulator: None,
            total_written: 0,
        }
    }

    /// Create a buffer fed by averaging every `factor` offered values
    pub fn downsampled(capacity: usize, factor: u32) -> Self {
        Self {
            accumulator: Some(Accumulator::new(factor)),
            ..Self::new(capacity)
        }
    }

    /// Store a sample, overwriting the oldest once full
    pub fn push(&mut self, value: f64) {
        self.values[self.index] = value;
        self.index = (self.index + 1) % self.values.len();
        if self.index == 0 {
            self.wrapped = true;
        }
        self.total_written += 1;
    }

    /// Offer a finer-horizon value to the accumulator.
    ///
    /// When the accumulator completes a window its mean is pushed and
    /// returned. Buffers without an accumulator store every value.
    pub fn offer(&mut self, value: f64) -> Option<f64> {
        let point = match self.accumulator.as_mut() {
            Some(acc) => acc.add(value)?,
            None => value,
        };
        self.push(point);
        Some(point)
    }

    /// Number of samples currently retained
    pub fn len(&self) -> usize {
        if self.wrapped {
            self.values.len()
        } else {
            self.index
        }
    }

    /// Check if buffer is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get the buffer capacity
    pub fn capacity(&self) -> usize {
        self.values.len()
    }

    /// Slot the next sample goes to
    pub fn index(&self) -> usize {
        self.index
    }

    /// True once the buffer has filled at least once
    pub fn has_wrapped(&self) -> bool {
        self.wrapped
    }

    /// Most recently stored sample
    pub fn latest(&self) -> Option<f64> {
        if self.is_empty() {
            return None;
        }
        let last = (self.index + self.values.len() - 1) % self.values.len();
        Some(self.values[last])
    }

    /// Retained samples, oldest first
    pub fn ordered(&self) -> Vec<f64> {
        if self.wrapped {
            let (newer, older) = self.values.split_at(self.index);
            older.iter().chain(newer).copied().collect()
        } else {
            self.values[..self.index].to_vec()
        }
    }

    /// Pending accumulator state, if this buffer is downsampled
    pub fn accumulator(&self) -> Option<&Accumulator> {
        self.accumulator.as_ref()
    }

    /// Get total samples written (for statistics)
    pub fn total_written(&self) -> u64 {
        self.total_written
    }
}
