//! Three-Horizon Aggregator
//!
//! This is the "advance clock" half of the pipeline. The caller supplies a
//! monotonic timestamp; a fine sample is taken only once the configured
//! interval has passed since the previous one, so an irregular call cadence
//! just delays sampling.

use crate::channel::{Channel, Horizon};
use crate::config::{AggregatorConfig, SeriesConfig};
use crate::error::AggregatorError;
use n2k_protocol::TelemetryState;
use ring_buffer::SeriesBuffer;
use storage::{SampleRecord, SampleSink};
use tracing::{debug, info, warn};

/// Result of [`Aggregator::maybe_store`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOutcome {
    /// The sampling interval has not elapsed yet
    NotDue,
    /// A fine sample was taken
    Stored {
        /// Points finalized across all channels and horizons
        points: usize,
        /// Points the sink failed to persist
        sink_failures: usize,
    },
}

/// Session extremes of true wind speed
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SessionStats {
    pub true_wind_min_ms: Option<f64>,
    pub true_wind_max_ms: Option<f64>,
    /// Sampling passes that stored at least one channel
    pub samples: u64,
}

impl SessionStats {
    fn observe(&mut self, true_wind_ms: f64) {
        self.samples += 1;
        let min = self.true_wind_min_ms.map_or(true_wind_ms, |m| m.min(true_wind_ms));
        let max = self.true_wind_max_ms.map_or(true_wind_ms, |m| m.max(true_wind_ms));
        self.true_wind_min_ms = Some(min);
        self.true_wind_max_ms = Some(max);
    }
}

/// The three histories of one channel
#[derive(Debug, Clone)]
struct ChannelSeries {
    channel: Channel,
    interval_ms: u64,
    last_sample_ms: Option<u64>,
    fine: SeriesBuffer,
    medium: SeriesBuffer,
    coarse: SeriesBuffer,
}

impl ChannelSeries {
    fn new(series: &SeriesConfig, config: &AggregatorConfig) -> Self {
        let capacity = config.capacity_of(series);
        Self {
            channel: series.channel,
            interval_ms: config.interval_of(series),
            last_sample_ms: None,
            fine: SeriesBuffer::new(capacity),
            medium: SeriesBuffer::downsampled(capacity, config.medium_factor),
            coarse: SeriesBuffer::downsampled(capacity, config.coarse_factor),
        }
    }

    /// The first check is always due
    fn is_due(&self, now_ms: u64) -> bool {
        match self.last_sample_ms {
            Some(last) => now_ms.saturating_sub(last) >= self.interval_ms,
            None => true,
        }
    }

    fn buffer(&self, horizon: Horizon) -> &SeriesBuffer {
        match horizon {
            Horizon::Fine => &self.fine,
            Horizon::Medium => &self.medium,
            Horizon::Coarse => &self.coarse,
        }
    }
}

/// Rolling multi-resolution history of the configured channels
pub struct Aggregator {
    series: Vec<ChannelSeries>,
    session: SessionStats,
    sink_healthy: bool,
    total_sink_failures: u64,
}

impl Aggregator {
    /// Allocate every series up front
    pub fn new(config: AggregatorConfig) -> Result<Self, AggregatorError> {
        config.validate()?;
        info!(
            "Aggregator logging {} channels, N1={}, N2={}",
            config.channels.len(),
            config.medium_factor,
            config.coarse_factor
        );
        for series in &config.channels {
            let spans: Vec<String> = Horizon::ALL
                .iter()
                .map(|&horizon| match config.span_ms(series, horizon) {
                    Some(ms) => format!("{} {} s", horizon.label(), ms / 1000),
                    None => format!("{} unbounded", horizon.label()),
                })
                .collect();
            info!(
                "  {}: {} points every {} ms ({})",
                series.channel.name(),
                config.capacity_of(series),
                config.interval_of(series),
                spans.join(", ")
            );
        }

        let series = config
            .channels
            .iter()
            .map(|series| ChannelSeries::new(series, &config))
            .collect();
        Ok(Self {
            series,
            session: SessionStats::default(),
            sink_healthy: true,
            total_sink_failures: 0,
        })
    }

    /// Sample every channel from `state` whose interval has elapsed.
    ///
    /// Each channel keeps its own time gate and its first call always
    /// samples. Sink failures are logged and counted but never stop
    /// in-memory aggregation.
    pub fn maybe_store<S: SampleSink + ?Sized>(
        &mut self,
        now_ms: u64,
        state: &TelemetryState,
        sink: &mut S,
    ) -> StoreOutcome {
        let mut sampled = false;
        let mut points = 0;
        let mut sink_failures = 0;
        for idx in 0..self.series.len() {
            if !self.series[idx].is_due(now_ms) {
                continue;
            }
            self.series[idx].last_sample_ms = Some(now_ms);
            sampled = true;

            let value = self.series[idx].channel.read(state);
            let (p, f) = self.push_series(idx, now_ms, value, sink);
            points += p;
            sink_failures += f;
        }
        if !sampled {
            return StoreOutcome::NotDue;
        }

        self.session.observe(state.true_wind_speed_ms());
        debug!("Stored sample at {} ms ({} points)", now_ms, points);
        StoreOutcome::Stored {
            points,
            sink_failures,
        }
    }

    fn push_series<S: SampleSink + ?Sized>(
        &mut self,
        idx: usize,
        timestamp_ms: u64,
        value: f64,
        sink: &mut S,
    ) -> (usize, usize) {
        let mut finalized = Vec::with_capacity(3);
        let series = &mut self.series[idx];
        let channel = series.channel;

        series.fine.push(value);
        finalized.push((Horizon::Fine, value));
        if let Some(medium) = series.medium.offer(value) {
            finalized.push((Horizon::Medium, medium));
            if let Some(coarse) = series.coarse.offer(medium) {
                finalized.push((Horizon::Coarse, coarse));
            }
        }

        let mut failures = 0;
        for &(horizon, point) in &finalized {
            if !self.forward(sink, channel, horizon, timestamp_ms, point) {
                failures += 1;
            }
        }
        (finalized.len(), failures)
    }

    fn forward<S: SampleSink + ?Sized>(
        &mut self,
        sink: &mut S,
        channel: Channel,
        horizon: Horizon,
        timestamp_ms: u64,
        value: f64,
    ) -> bool {
        let record = SampleRecord {
            channel: channel.name(),
            horizon: horizon.label(),
            timestamp_ms,
            value,
        };
        match sink.append(&record) {
            Ok(()) => {
                if !self.sink_healthy {
                    info!("Sample sink recovered");
                    self.sink_healthy = true;
                }
                true
            }
            Err(e) => {
                self.total_sink_failures += 1;
                if self.sink_healthy {
                    warn!("Sample sink failed, continuing in memory: {}", e);
                    self.sink_healthy = false;
                } else {
                    debug!("Sample sink still failing: {}", e);
                }
                false
            }
        }
    }

    /// History of one channel at one horizon
    pub fn series(&self, channel: Channel, horizon: Horizon) -> Option<&SeriesBuffer> {
        self.series
            .iter()
            .find(|s| s.channel == channel)
            .map(|s| s.buffer(horizon))
    }

    pub fn session(&self) -> &SessionStats {
        &self.session
    }

    /// Timestamp of the last fine sample of `channel`
    pub fn last_sample_ms(&self, channel: Channel) -> Option<u64> {
        self.series
            .iter()
            .find(|s| s.channel == channel)
            .and_then(|s| s.last_sample_ms)
    }

    /// Rows the sink has rejected since startup
    pub fn total_sink_failures(&self) -> u64 {
        self.total_sink_failures
    }
}
