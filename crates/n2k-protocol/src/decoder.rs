//! Frame Dispatch into the Telemetry State

use crate::frame::CanFrame;
use crate::parser::{ParserStats, SlcanParser};
use crate::pgn;
use crate::state::TelemetryState;
use tracing::{debug, trace};

/// Result of dispatching a single frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The PGN was decoded and merged into the state
    Applied(u32),
    /// The PGN is known but the payload was too short; nothing was updated
    TooShort(u32),
    /// No decoder for this PGN
    Unknown(u32),
}

/// Summary of one [`TelemetryDecoder::feed`] call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeedReport {
    /// Complete frames produced by the parser
    pub frames: usize,
    /// Frames that updated the state
    pub applied: usize,
    /// Frames of a known PGN rejected for length
    pub too_short: usize,
}

/// Owns the SLCAN parser and the telemetry state it feeds.
///
/// This is the "feed bytes" half of the pipeline: it never blocks and
/// accepts any number of bytes per call.
#[derive(Debug, Clone, Default)]
pub struct TelemetryDecoder {
    parser: SlcanParser,
    state: TelemetryState,
}

impl TelemetryDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `bytes` and dispatch every completed frame in stream order
    pub fn feed(&mut self, bytes: &[u8]) -> FeedReport {
        let mut report = FeedReport::default();
        for frame in self.parser.push(bytes) {
            report.frames += 1;
            match self.dispatch(&frame) {
                DispatchOutcome::Applied(_) => report.applied += 1,
                DispatchOutcome::TooShort(_) => report.too_short += 1,
                DispatchOutcome::Unknown(_) => {}
            }
        }
        report
    }

    /// Decode one frame and merge the result into the state
    pub fn dispatch(&mut self, frame: &CanFrame) -> DispatchOutcome {
        let pgn = pgn::pgn_from_id(frame.id());
        let Some(decoder) = pgn::decoder_for(pgn) else {
            trace!(
                "Ignoring PGN {} from {} (priority {})",
                pgn,
                pgn::source_from_id(frame.id()),
                pgn::priority_from_id(frame.id())
            );
            return DispatchOutcome::Unknown(pgn);
        };

        if frame.len() < decoder.min_len {
            debug!(
                "{} (PGN {}) too short: {} < {} bytes",
                decoder.name,
                pgn,
                frame.len(),
                decoder.min_len
            );
            return DispatchOutcome::TooShort(pgn);
        }

        let update = (decoder.decode)(frame.payload());
        self.state.apply(&update);
        DispatchOutcome::Applied(pgn)
    }

    /// Current telemetry snapshot
    pub fn state(&self) -> &TelemetryState {
        &self.state
    }

    /// Mutable access for echoing outbound commands
    pub fn state_mut(&mut self) -> &mut TelemetryState {
        &mut self.state
    }

    pub fn parser_stats(&self) -> ParserStats {
        self.parser.stats()
    }
}
