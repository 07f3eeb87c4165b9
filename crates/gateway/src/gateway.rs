//! Gateway core and cooperative run loop

use crate::config::{ConfigError, GatewayConfig};
use crate::operator::OperatorCommand;
use metrics::counter;
use n2k_protocol::{
    CanFrame, CommandEncoder, FeedReport, N2kError, SlcanReader, SlcanWriter, TelemetryDecoder,
    TelemetryState,
};
use series_aggregator::{Aggregator, StoreOutcome};
use storage::SampleSink;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info};

/// How often the loop offers the aggregator a chance to sample
const CLOCK_TICK_MS: u64 = 250;

/// Decoder, aggregator and command encoder behind two entry points:
/// [`Gateway::feed_bytes`] and [`Gateway::advance_clock`].
pub struct Gateway {
    decoder: TelemetryDecoder,
    aggregator: Aggregator,
    encoder: CommandEncoder,
    sink: Box<dyn SampleSink + Send>,
}

impl Gateway {
    pub fn new(config: &GatewayConfig, sink: Box<dyn SampleSink + Send>) -> Result<Self, ConfigError> {
        Ok(Self {
            decoder: TelemetryDecoder::new(),
            aggregator: Aggregator::new(config.series.clone())?,
            encoder: CommandEncoder::new(config.command.source_address, config.command.priority),
            sink,
        })
    }

    /// Parse and decode whatever bytes arrived
    pub fn feed_bytes(&mut self, bytes: &[u8]) -> FeedReport {
        let report = self.decoder.feed(bytes);
        counter!("n2k_bytes_total").increment(bytes.len() as u64);
        counter!("n2k_frames_total").increment(report.frames as u64);
        counter!("n2k_frames_applied_total").increment(report.applied as u64);
        counter!("n2k_frames_too_short_total").increment(report.too_short as u64);
        report
    }

    /// Give the aggregator a chance to take its next sample
    pub fn advance_clock(&mut self, now_ms: u64) -> StoreOutcome {
        let outcome = self
            .aggregator
            .maybe_store(now_ms, self.decoder.state(), &mut self.sink);
        if let StoreOutcome::Stored {
            points,
            sink_failures,
        } = outcome
        {
            counter!("n2k_points_total").increment(points as u64);
            counter!("n2k_sink_failures_total").increment(sink_failures as u64);
        }
        outcome
    }

    /// Turn operator intent into an outbound frame and echo it locally
    pub fn command(&mut self, command: &OperatorCommand) -> CanFrame {
        let autopilot = command.resolve(self.decoder.state());
        self.decoder.state_mut().apply_command(&autopilot);
        info!(
            "Autopilot command: engaged={} mode={:?} setpoint={:.1}",
            autopilot.engaged,
            autopilot.mode,
            autopilot.normalized_setpoint()
        );
        counter!("n2k_commands_total").increment(1);
        self.encoder.encode(&autopilot)
    }

    pub fn state(&self) -> &TelemetryState {
        self.decoder.state()
    }

    pub fn decoder(&self) -> &TelemetryDecoder {
        &self.decoder
    }

    pub fn aggregator(&self) -> &Aggregator {
        &self.aggregator
    }
}

/// Drive the gateway from a byte stream until the stream closes.
///
/// One task owns all state: bytes, clock ticks and operator commands are
/// handled in turn, so nothing needs locking.
pub async fn run<R, W>(
    gateway: &mut Gateway,
    mut reader: SlcanReader<R>,
    mut writer: SlcanWriter<W>,
    mut commands: mpsc::Receiver<OperatorCommand>,
) -> Result<(), N2kError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let start = Instant::now();
    let mut clock = tokio::time::interval(Duration::from_millis(CLOCK_TICK_MS));
    clock.set_missed_tick_behavior(MissedTickBehavior::Skip);
    info!("Gateway running");

    loop {
        tokio::select! {
            chunk = reader.read_chunk() => match chunk {
                Ok(bytes) => {
                    gateway.feed_bytes(bytes);
                }
                Err(N2kError::BridgeClosed) => break,
                Err(e) => return Err(e),
            },
            _ = clock.tick() => {
                let now_ms = start.elapsed().as_millis() as u64;
                if let StoreOutcome::Stored { points, .. } = gateway.advance_clock(now_ms) {
                    debug!("Sampled at {} ms, {} points", now_ms, points);
                }
            }
            Some(command) = commands.recv() => {
                let frame = gateway.command(&command);
                writer.send_frame(&frame).await?;
            }
        }
    }

    info!(
        "CAN bridge closed after {} bytes, {} frames in, {} frames out",
        reader.bytes_read(),
        gateway.decoder().parser_stats().frames,
        writer.frames_sent()
    );
    Ok(())
}
