//! Running-Average Accumulator

use serde::{Deserialize, Serialize};

/// Averages fixed-size windows of consecutive values
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Accumulator {
    sum: f64,
    count: u32,
    factor: u32,
}

impl Accumulator {
    /// Create an accumulator producing one mean per `factor` values.
    ///
    /// A zero factor is raised to 1.
    pub fn new(factor: u32) -> Self {
        Self {
            sum: 0.0,
            count: 0,
            factor: factor.max(1),
        }
    }

    /// Add a value. Returns the window mean and resets when the window is
    /// complete.
    pub fn add(&mut self, value: f64) -> Option<f64> {
        self.sum += value;
        self.count += 1;
        if self.count < self.factor {
            return None;
        }
        let mean = self.sum / self.count as f64;
        self.sum = 0.0;
        self.count = 0;
        Some(mean)
    }

    /// Values collected in the current window
    pub fn count(&self) -> u32 {
        self.count
    }

    /// Running sum of the current window
    pub fn sum(&self) -> f64 {
        self.sum
    }

    /// Window size
    pub fn factor(&self) -> u32 {
        self.factor
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_and_reset() {
        let mut acc = Accumulator::new(4);
        assert_eq!(acc.add(1.0), None);
        assert_eq!(acc.add(2.0), None);
        assert_eq!(acc.add(3.0), None);
        assert_eq!(acc.add(6.0), Some(3.0));
        assert_eq!(acc.count(), 0);
        assert_eq!(acc.sum(), 0.0);

        // a following single value does not produce another mean
        assert_eq!(acc.add(100.0), None);
        assert_eq!(acc.count(), 1);
    }

    #[test]
    fn test_zero_factor_clamped() {
        let mut acc = Accumulator::new(0);
        assert_eq!(acc.factor(), 1);
        assert_eq!(acc.add(7.0), Some(7.0));
    }
}
