//! Autopilot Command Encoding (PGN 127237)

use crate::address;
use crate::frame::CanFrame;
use crate::pgn::{self, HEADING_TRACK_CONTROL};
use crate::state::ApMode;
use serde::{Deserialize, Serialize};

/// Degrees to 0.0001 rad wire units
const DEG_TO_RAD4: f64 = std::f64::consts::PI / 180.0 * 10_000.0;

/// Operator intent for the autopilot
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AutopilotCommand {
    pub engaged: bool,
    pub mode: ApMode,
    /// Requested setpoint, any real value; normalized on encode
    pub setpoint_deg: f64,
}

impl AutopilotCommand {
    pub fn new(engaged: bool, mode: ApMode, setpoint_deg: f64) -> Self {
        Self {
            engaged,
            mode,
            setpoint_deg,
        }
    }

    /// Setpoint mapped into [0, 360)
    pub fn normalized_setpoint(&self) -> f64 {
        let deg = self.setpoint_deg.rem_euclid(360.0);
        // rem_euclid can round up to exactly 360 for tiny negative inputs
        if deg >= 360.0 {
            0.0
        } else {
            deg
        }
    }

    /// Setpoint in signed 0.0001 rad units.
    ///
    /// Angles past 180 degrees are sent as their negative equivalent so the
    /// value fits an i16; receivers add 360 to negative angles.
    pub fn setpoint_raw(&self) -> i16 {
        let deg = self.normalized_setpoint();
        let signed = if deg > 180.0 { deg - 360.0 } else { deg };
        (signed * DEG_TO_RAD4).round() as i16
    }

    /// 8-byte PGN 127237 payload: mode, engage flag, setpoint, zero fill
    pub fn payload(&self) -> [u8; 8] {
        let sp = self.setpoint_raw().to_le_bytes();
        [
            self.mode.as_u8(),
            u8::from(self.engaged),
            sp[0],
            sp[1],
            0,
            0,
            0,
            0,
        ]
    }
}

/// Builds outbound autopilot frames for a fixed source address and priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandEncoder {
    pub source_address: u8,
    pub priority: u8,
}

impl CommandEncoder {
    pub fn new(source_address: u8, priority: u8) -> Self {
        Self {
            source_address,
            priority,
        }
    }

    /// Identifier used for every autopilot command
    pub fn can_id(&self) -> u32 {
        pgn::can_id(
            HEADING_TRACK_CONTROL,
            self.source_address,
            self.priority,
            address::BROADCAST,
        )
    }

    /// Encode a command into a broadcast CAN frame
    pub fn encode(&self, command: &AutopilotCommand) -> CanFrame {
        let payload = command.payload();
        CanFrame::new(self.can_id(), &payload).unwrap_or_default()
    }
}

impl Default for CommandEncoder {
    fn default() -> Self {
        Self::new(address::DEFAULT_SOURCE, address::DEFAULT_PRIORITY)
    }
}
