//! Aggregator configuration

use crate::channel::{Channel, Horizon};
use crate::error::AggregatorError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// One logged channel.
///
/// Unset capacity and interval fall back to the aggregator-wide defaults.
/// A bare channel name is accepted in place of a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "SeriesEntry")]
pub struct SeriesConfig {
    pub channel: Channel,
    /// Points retained per horizon
    pub capacity: Option<usize>,
    /// Minimum time between fine samples (milliseconds)
    pub interval_ms: Option<u64>,
}

impl SeriesConfig {
    /// Series using the aggregator-wide capacity and interval
    pub fn new(channel: Channel) -> Self {
        Self {
            channel,
            capacity: None,
            interval_ms: None,
        }
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = Some(capacity);
        self
    }

    pub fn with_interval_ms(mut self, interval_ms: u64) -> Self {
        self.interval_ms = Some(interval_ms);
        self
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SeriesEntry {
    Name(Channel),
    Table {
        channel: Channel,
        #[serde(default)]
        capacity: Option<usize>,
        #[serde(default)]
        interval_ms: Option<u64>,
    },
}

impl From<SeriesEntry> for SeriesConfig {
    fn from(entry: SeriesEntry) -> Self {
        match entry {
            SeriesEntry::Name(channel) => SeriesConfig::new(channel),
            SeriesEntry::Table {
                channel,
                capacity,
                interval_ms,
            } => SeriesConfig {
                channel,
                capacity,
                interval_ms,
            },
        }
    }
}

/// Sizes and cadence of the three horizons
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregatorConfig {
    /// Default points retained per horizon
    pub fine_capacity: usize,

    /// Default minimum time between fine samples (milliseconds)
    pub sample_interval_ms: u64,

    /// Fine samples averaged into one medium point (N₁)
    pub medium_factor: u32,

    /// Medium points averaged into one coarse point (N₂)
    pub coarse_factor: u32,

    /// Channels to log
    pub channels: Vec<SeriesConfig>,
}

impl Default for AggregatorConfig {
    /// 360 points at 10 s: 1 h fine, 6 h medium, 24 h coarse
    fn default() -> Self {
        Self {
            fine_capacity: 360,
            sample_interval_ms: 10_000,
            medium_factor: 6,
            coarse_factor: 4,
            channels: vec![
                SeriesConfig::new(Channel::BatteryVoltage),
                SeriesConfig::new(Channel::TrueWindSpeed),
            ],
        }
    }
}

impl AggregatorConfig {
    /// Reject zero sizes and duplicate channels
    pub fn validate(&self) -> Result<(), AggregatorError> {
        if self.fine_capacity == 0 {
            return Err(AggregatorError::ZeroValue("fine_capacity"));
        }
        if self.sample_interval_ms == 0 {
            return Err(AggregatorError::ZeroValue("sample_interval_ms"));
        }
        if self.medium_factor == 0 {
            return Err(AggregatorError::ZeroValue("medium_factor"));
        }
        if self.coarse_factor == 0 {
            return Err(AggregatorError::ZeroValue("coarse_factor"));
        }

        let mut seen = HashSet::new();
        for series in &self.channels {
            if !seen.insert(series.channel) {
                return Err(AggregatorError::DuplicateChannel(series.channel.name()));
            }
            if series.capacity == Some(0) {
                return Err(AggregatorError::ZeroValue("capacity"));
            }
            if series.interval_ms == Some(0) {
                return Err(AggregatorError::ZeroValue("interval_ms"));
            }
        }
        Ok(())
    }

    /// Effective capacity of a series
    pub fn capacity_of(&self, series: &SeriesConfig) -> usize {
        series.capacity.unwrap_or(self.fine_capacity)
    }

    /// Effective sampling interval of a series
    pub fn interval_of(&self, series: &SeriesConfig) -> u64 {
        series.interval_ms.unwrap_or(self.sample_interval_ms)
    }

    /// Time span covered by a full horizon of `series` (milliseconds).
    ///
    /// `None` if it does not fit in a `u64`.
    pub fn span_ms(&self, series: &SeriesConfig, horizon: Horizon) -> Option<u64> {
        let interval = self.interval_of(series);
        let per_point = match horizon {
            Horizon::Fine => Some(interval),
            Horizon::Medium => interval.checked_mul(self.medium_factor as u64),
            Horizon::Coarse => interval
                .checked_mul(self.medium_factor as u64)?
                .checked_mul(self.coarse_factor as u64),
        };
        per_point?.checked_mul(self.capacity_of(series) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_spans() {
        let config = AggregatorConfig::default();
        assert!(config.validate().is_ok());
        let series = config.channels[0];
        assert_eq!(config.span_ms(&series, Horizon::Fine), Some(3_600_000));
        assert_eq!(config.span_ms(&series, Horizon::Medium), Some(6 * 3_600_000));
        assert_eq!(config.span_ms(&series, Horizon::Coarse), Some(24 * 3_600_000));
    }

    #[test]
    fn test_per_series_overrides() {
        let config = AggregatorConfig::default();
        let series = SeriesConfig::new(Channel::Heading)
            .with_capacity(60)
            .with_interval_ms(1000);
        assert_eq!(config.capacity_of(&series), 60);
        assert_eq!(config.interval_of(&series), 1000);
        assert_eq!(config.span_ms(&series, Horizon::Fine), Some(60_000));
    }

    #[test]
    fn test_span_overflow_is_none() {
        let config = AggregatorConfig {
            sample_interval_ms: u64::MAX / 2,
            ..Default::default()
        };
        let series = config.channels[0];
        assert_eq!(config.span_ms(&series, Horizon::Coarse), None);
    }

    #[test]
    fn test_rejects_zero_values() {
        let config = AggregatorConfig {
            medium_factor: 0,
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(AggregatorError::ZeroValue("medium_factor"))
        );

        let config = AggregatorConfig {
            channels: vec![SeriesConfig::new(Channel::Heading).with_interval_ms(0)],
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(AggregatorError::ZeroValue("interval_ms"))
        );
    }

    #[test]
    fn test_rejects_duplicate_channels() {
        let config = AggregatorConfig {
            channels: vec![
                SeriesConfig::new(Channel::Heading),
                SeriesConfig::new(Channel::Heading).with_capacity(10),
            ],
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(AggregatorError::DuplicateChannel("heading"))
        );
    }
}
