//! NMEA2000 over SLCAN
//!
//! This crate turns the textual SLCAN stream of a serial CAN bridge into
//! decoded marine telemetry, and builds autopilot command frames for the
//! reverse path. Parsing and decoding are synchronous and never block; the
//! async bridge only moves bytes.

mod bridge;
mod command;
mod decoder;
mod error;
mod frame;
mod parser;
pub mod pgn;
mod state;

pub use bridge::{open_serial, SlcanReader, SlcanWriter};
pub use command::{AutopilotCommand, CommandEncoder};
pub use decoder::{DispatchOutcome, FeedReport, TelemetryDecoder};
pub use error::N2kError;
pub use frame::CanFrame;
pub use parser::{ParserStats, SlcanParser};
pub use state::{ApMode, Gear, TelemetryState, TelemetryUpdate};

/// NMEA2000 addressing constants
pub mod address {
    /// Global (broadcast) destination address
    pub const BROADCAST: u8 = 0xFF;
    /// Default source address for frames sent by this node
    pub const DEFAULT_SOURCE: u8 = 0x64;
    /// Default priority for autopilot commands
    pub const DEFAULT_PRIORITY: u8 = 2;
}
