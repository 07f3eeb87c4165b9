//! NMEA2000 Parameter Group Numbers
//!
//! Maps 29-bit CAN identifiers to PGNs and back, and holds the decode table
//! for every PGN this node understands. Adding a PGN means adding a row to
//! [`DECODERS`].
//!
//! Identifier layout (bit 28 first):
//!
//! ```text
//! | priority (3) | EDP (1) | DP (1) | PF (8) | PS (8) | source (8) |
//! ```
//!
//! PF < 240 is PDU1: PS is a destination address and not part of the PGN.
//! PF >= 240 is PDU2: PS is the group extension and belongs to the PGN.

use crate::state::{ApMode, Gear, TelemetryUpdate};
use tracing::debug;

/// First PDU Format value of the broadcast (PDU2) range
pub const PDU2_THRESHOLD: u8 = 240;

/// Heading/Track Control (autopilot)
pub const HEADING_TRACK_CONTROL: u32 = 127237;
/// Rudder
pub const RUDDER: u32 = 127245;
/// Vessel Heading
pub const VESSEL_HEADING: u32 = 127250;
/// Engine Parameters, Rapid Update
pub const ENGINE_RAPID: u32 = 127488;
/// Transmission Parameters, Dynamic
pub const TRANSMISSION: u32 = 127493;
/// DC Detailed Status
pub const DC_DETAILED_STATUS: u32 = 127506;
/// Battery Status
pub const BATTERY_STATUS: u32 = 127508;
/// Speed, Water Referenced
pub const SPEED_WATER: u32 = 128259;
/// Cross Track Error
pub const CROSS_TRACK_ERROR: u32 = 129283;
/// Wind Data
pub const WIND_DATA: u32 = 130306;

const SENTINEL_I16: i16 = 0x7FFF;
const SENTINEL_U16: u16 = 0xFFFF;
const SENTINEL_U8: u8 = 0xFF;
const SENTINEL_I32: i32 = 0x7FFF_FFFF;

const MS_TO_KNOTS: f64 = 1.943844;

/// Extract the PGN from a 29-bit identifier
pub fn pgn_from_id(id: u32) -> u32 {
    let data_page = (id >> 24) & 0x03;
    let pf = ((id >> 16) & 0xFF) as u8;
    let ps = ((id >> 8) & 0xFF) as u8;
    let base = (data_page << 16) | ((pf as u32) << 8);
    if pf < PDU2_THRESHOLD {
        base
    } else {
        base | ps as u32
    }
}

/// Source address of a 29-bit identifier
pub fn source_from_id(id: u32) -> u8 {
    (id & 0xFF) as u8
}

/// Priority (0-7) of a 29-bit identifier
pub fn priority_from_id(id: u32) -> u8 {
    ((id >> 26) & 0x07) as u8
}

/// Build a 29-bit identifier, mirroring [`pgn_from_id`].
///
/// For PDU1 PGNs the destination goes into PS; for PDU2 PGNs PS comes from
/// the PGN and `destination` is ignored.
pub fn can_id(pgn: u32, source: u8, priority: u8, destination: u8) -> u32 {
    let data_page = (pgn >> 16) & 0x03;
    let pf = ((pgn >> 8) & 0xFF) as u8;
    let ps = if pf < PDU2_THRESHOLD {
        destination
    } else {
        (pgn & 0xFF) as u8
    };
    ((priority as u32 & 0x07) << 26)
        | (data_page << 24)
        | ((pf as u32) << 16)
        | ((ps as u32) << 8)
        | source as u32
}

/// One row of the decode table
#[derive(Debug, Clone, Copy)]
pub struct PgnDecoder {
    pub pgn: u32,
    pub name: &'static str,
    /// Shortest payload that carries every field of this PGN
    pub min_len: usize,
    /// Decode a payload of at least `min_len` bytes
    pub decode: fn(&[u8]) -> TelemetryUpdate,
}

/// Every PGN this node decodes
pub static DECODERS: &[PgnDecoder] = &[
    PgnDecoder {
        pgn: SPEED_WATER,
        name: "Speed, Water Referenced",
        min_len: 3,
        decode: decode_speed_water,
    },
    PgnDecoder {
        pgn: ENGINE_RAPID,
        name: "Engine Parameters, Rapid Update",
        min_len: 4,
        decode: decode_engine_rapid,
    },
    PgnDecoder {
        pgn: TRANSMISSION,
        name: "Transmission Parameters, Dynamic",
        min_len: 2,
        decode: decode_transmission,
    },
    PgnDecoder {
        pgn: BATTERY_STATUS,
        name: "Battery Status",
        min_len: 5,
        decode: decode_battery_status,
    },
    PgnDecoder {
        pgn: DC_DETAILED_STATUS,
        name: "DC Detailed Status",
        min_len: 2,
        decode: decode_dc_detailed_status,
    },
    PgnDecoder {
        pgn: WIND_DATA,
        name: "Wind Data",
        min_len: 6,
        decode: decode_wind,
    },
    PgnDecoder {
        pgn: VESSEL_HEADING,
        name: "Vessel Heading",
        min_len: 3,
        decode: decode_heading,
    },
    PgnDecoder {
        pgn: RUDDER,
        name: "Rudder",
        min_len: 2,
        decode: decode_rudder,
    },
    PgnDecoder {
        pgn: HEADING_TRACK_CONTROL,
        name: "Heading/Track Control",
        min_len: 4,
        decode: decode_heading_track_control,
    },
    PgnDecoder {
        pgn: CROSS_TRACK_ERROR,
        name: "Cross Track Error",
        min_len: 6,
        decode: decode_cross_track_error,
    },
];

/// Look up the decoder for a PGN
pub fn decoder_for(pgn: u32) -> Option<&'static PgnDecoder> {
    DECODERS.iter().find(|d| d.pgn == pgn)
}

/// Convert 0.0001 rad units to degrees
pub fn rad4_to_degrees(raw: i16) -> f64 {
    (raw as f64 * 0.0001).to_degrees()
}

/// Map negative angles into [0, 360)
pub fn normalize_degrees(deg: f64) -> f64 {
    if deg < 0.0 {
        deg + 360.0
    } else {
        deg
    }
}

fn le_i16(d: &[u8], offset: usize) -> i16 {
    i16::from_le_bytes([d[offset], d[offset + 1]])
}

fn le_u16(d: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([d[offset], d[offset + 1]])
}

fn field_i16(d: &[u8], offset: usize) -> Option<i16> {
    Some(le_i16(d, offset)).filter(|&raw| raw != SENTINEL_I16)
}

fn angle(d: &[u8], offset: usize) -> Option<f64> {
    field_i16(d, offset).map(|raw| normalize_degrees(rad4_to_degrees(raw)))
}

fn decode_speed_water(d: &[u8]) -> TelemetryUpdate {
    TelemetryUpdate {
        speed_through_water_kts: field_i16(d, 1).map(|raw| raw as f64 * 0.01 * MS_TO_KNOTS),
        ..Default::default()
    }
}

fn decode_engine_rapid(d: &[u8]) -> TelemetryUpdate {
    let raw = le_u16(d, 2);
    TelemetryUpdate {
        engine_rpm: (raw != SENTINEL_U16).then(|| (raw as f64 * 0.25).round() as u32),
        ..Default::default()
    }
}

fn decode_transmission(d: &[u8]) -> TelemetryUpdate {
    TelemetryUpdate {
        gear: Some(Gear::from_bits(d[1])),
        ..Default::default()
    }
}

fn decode_battery_status(d: &[u8]) -> TelemetryUpdate {
    TelemetryUpdate {
        battery_voltage: field_i16(d, 1).map(|raw| raw as f64 * 0.01),
        battery_current: field_i16(d, 3).map(|raw| raw as f64 * 0.1),
        ..Default::default()
    }
}

fn decode_dc_detailed_status(d: &[u8]) -> TelemetryUpdate {
    TelemetryUpdate {
        state_of_charge_pct: Some(d[1]).filter(|&soc| soc != SENTINEL_U8),
        ..Default::default()
    }
}

fn decode_wind(d: &[u8]) -> TelemetryUpdate {
    let speed = field_i16(d, 1).map(|raw| raw as f64 * 0.01);
    let direction = angle(d, 3);
    match d[5] {
        1 => TelemetryUpdate {
            apparent_wind_speed_ms: speed,
            apparent_wind_angle_deg: direction,
            ..Default::default()
        },
        2 | 3 => TelemetryUpdate {
            true_wind_speed_ms: speed,
            true_wind_angle_deg: direction,
            ..Default::default()
        },
        _ => TelemetryUpdate::default(),
    }
}

fn decode_heading(d: &[u8]) -> TelemetryUpdate {
    TelemetryUpdate {
        heading_deg: angle(d, 1),
        ..Default::default()
    }
}

fn decode_rudder(d: &[u8]) -> TelemetryUpdate {
    TelemetryUpdate {
        rudder_angle_deg: field_i16(d, 0).map(rad4_to_degrees),
        ..Default::default()
    }
}

fn decode_heading_track_control(d: &[u8]) -> TelemetryUpdate {
    let ap_mode = match ApMode::try_from(d[0]) {
        Ok(mode) => Some(mode),
        Err(e) => {
            debug!("Ignoring autopilot mode: {}", e);
            None
        }
    };
    TelemetryUpdate {
        ap_mode,
        ap_engaged: Some(d[1] != 0),
        ap_setpoint_deg: angle(d, 2),
        ..Default::default()
    }
}

fn decode_cross_track_error(d: &[u8]) -> TelemetryUpdate {
    let raw = i32::from_le_bytes([d[2], d[3], d[4], d[5]]);
    TelemetryUpdate {
        cross_track_error_m: (raw != SENTINEL_I32).then(|| raw as f64 * 0.01),
        ..Default::default()
    }
}
