//! Telemetry State Store
//!
//! Holds the last known value of every decoded quantity. Fields are only
//! written through [`TelemetryState::apply`], which merges a
//! [`TelemetryUpdate`] produced by one PGN decoder; absent fields leave the
//! stored value untouched.

use crate::command::AutopilotCommand;
use crate::error::N2kError;
use serde::{Deserialize, Serialize};

/// Autopilot steering mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum ApMode {
    /// Autopilot idle
    #[default]
    Standby = 0,
    /// Hold a compass heading
    Heading = 1,
    /// Follow a route track
    Track = 2,
    /// Hold an apparent wind angle
    Wind = 3,
}

impl ApMode {
    /// Wire value of this mode
    pub fn as_u8(&self) -> u8 {
        *self as u8
    }
}

impl TryFrom<u8> for ApMode {
    type Error = N2kError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(ApMode::Standby),
            1 => Ok(ApMode::Heading),
            2 => Ok(ApMode::Track),
            3 => Ok(ApMode::Wind),
            other => Err(N2kError::InvalidMode(other)),
        }
    }
}

/// Transmission gear
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Gear {
    #[default]
    Neutral,
    Drive,
    Reverse,
}

impl Gear {
    /// Map the two gear bits of PGN 127493
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0x03 {
            1 => Gear::Drive,
            2 => Gear::Reverse,
            _ => Gear::Neutral,
        }
    }
}

/// Values produced by decoding one frame. `None` means "leave unchanged".
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TelemetryUpdate {
    pub speed_through_water_kts: Option<f64>,
    pub engine_rpm: Option<u32>,
    pub gear: Option<Gear>,
    pub battery_voltage: Option<f64>,
    pub battery_current: Option<f64>,
    pub state_of_charge_pct: Option<u8>,
    pub apparent_wind_speed_ms: Option<f64>,
    pub apparent_wind_angle_deg: Option<f64>,
    pub true_wind_speed_ms: Option<f64>,
    pub true_wind_angle_deg: Option<f64>,
    pub heading_deg: Option<f64>,
    pub ap_mode: Option<ApMode>,
    pub ap_engaged: Option<bool>,
    pub ap_setpoint_deg: Option<f64>,
    pub rudder_angle_deg: Option<f64>,
    pub cross_track_error_m: Option<f64>,
}

impl TelemetryUpdate {
    /// True when the update would not change anything
    pub fn is_empty(&self) -> bool {
        *self == TelemetryUpdate::default()
    }
}

/// Snapshot of the most recently decoded values
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TelemetryState {
    speed_through_water_kts: f64,
    engine_rpm: u32,
    gear: Gear,
    battery_voltage: f64,
    battery_current: f64,
    state_of_charge_pct: u8,
    soc_overview_pct: u8,
    apparent_wind_speed_ms: f64,
    apparent_wind_angle_deg: f64,
    true_wind_speed_ms: f64,
    true_wind_angle_deg: f64,
    heading_deg: f64,
    ap_mode: ApMode,
    ap_engaged: bool,
    ap_setpoint_deg: Option<f64>,
    rudder_angle_deg: f64,
    cross_track_error_m: f64,
}

impl TelemetryState {
    /// Power-on state: all quantities zero, autopilot in standby with no
    /// setpoint
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge a decoded update. Every present field is written; absent
    /// fields keep their previous value.
    pub fn apply(&mut self, update: &TelemetryUpdate) {
        merge(&mut self.speed_through_water_kts, update.speed_through_water_kts);
        merge(&mut self.engine_rpm, update.engine_rpm);
        merge(&mut self.gear, update.gear);
        merge(&mut self.battery_voltage, update.battery_voltage);
        merge(&mut self.battery_current, update.battery_current);
        merge(&mut self.state_of_charge_pct, update.state_of_charge_pct);
        merge(&mut self.soc_overview_pct, update.state_of_charge_pct);
        merge(&mut self.apparent_wind_speed_ms, update.apparent_wind_speed_ms);
        merge(&mut self.apparent_wind_angle_deg, update.apparent_wind_angle_deg);
        merge(&mut self.true_wind_speed_ms, update.true_wind_speed_ms);
        merge(&mut self.true_wind_angle_deg, update.true_wind_angle_deg);
        merge(&mut self.ap_mode, update.ap_mode);
        merge(&mut self.ap_engaged, update.ap_engaged);
        if update.ap_setpoint_deg.is_some() {
            self.ap_setpoint_deg = update.ap_setpoint_deg;
        }
        merge(&mut self.rudder_angle_deg, update.rudder_angle_deg);
        merge(&mut self.cross_track_error_m, update.cross_track_error_m);

        if let Some(heading) = update.heading_deg {
            self.heading_deg = heading;
            // One-time default: an idle autopilot starts from the current heading.
            if !self.ap_engaged && self.ap_setpoint_deg.is_none() {
                self.ap_setpoint_deg = Some(heading);
            }
        }
    }

    /// Echo an outbound autopilot command into the local state
    pub fn apply_command(&mut self, command: &AutopilotCommand) {
        self.ap_engaged = command.engaged;
        self.ap_mode = command.mode;
        self.ap_setpoint_deg = Some(command.normalized_setpoint());
    }

    /// Build a command that moves the current setpoint by `delta_deg`,
    /// keeping the current mode and engage state
    pub fn adjust_setpoint(&self, delta_deg: f64) -> AutopilotCommand {
        let base = self.ap_setpoint_deg.unwrap_or(self.heading_deg);
        AutopilotCommand::new(self.ap_engaged, self.ap_mode, base + delta_deg)
    }

    /// Speed through water (knots)
    pub fn speed_through_water_kts(&self) -> f64 {
        self.speed_through_water_kts
    }

    /// Engine speed (RPM)
    pub fn engine_rpm(&self) -> u32 {
        self.engine_rpm
    }

    pub fn gear(&self) -> Gear {
        self.gear
    }

    /// Battery voltage (V)
    pub fn battery_voltage(&self) -> f64 {
        self.battery_voltage
    }

    /// Battery current (A), negative while charging
    pub fn battery_current(&self) -> f64 {
        self.battery_current
    }

    /// State of charge (%)
    pub fn state_of_charge_pct(&self) -> u8 {
        self.state_of_charge_pct
    }

    /// State of charge mirrored for the overview page (%)
    pub fn soc_overview_pct(&self) -> u8 {
        self.soc_overview_pct
    }

    pub fn apparent_wind_speed_ms(&self) -> f64 {
        self.apparent_wind_speed_ms
    }

    pub fn apparent_wind_angle_deg(&self) -> f64 {
        self.apparent_wind_angle_deg
    }

    pub fn true_wind_speed_ms(&self) -> f64 {
        self.true_wind_speed_ms
    }

    pub fn true_wind_angle_deg(&self) -> f64 {
        self.true_wind_angle_deg
    }

    /// Vessel heading in [0, 360)
    pub fn heading_deg(&self) -> f64 {
        self.heading_deg
    }

    pub fn ap_mode(&self) -> ApMode {
        self.ap_mode
    }

    pub fn ap_engaged(&self) -> bool {
        self.ap_engaged
    }

    /// Autopilot setpoint, `None` until one is established
    pub fn ap_setpoint_deg(&self) -> Option<f64> {
        self.ap_setpoint_deg
    }

    /// Rudder angle (degrees, starboard positive)
    pub fn rudder_angle_deg(&self) -> f64 {
        self.rudder_angle_deg
    }

    /// Cross-track error (m)
    pub fn cross_track_error_m(&self) -> f64 {
        self.cross_track_error_m
    }
}

fn merge<T: Copy>(field: &mut T, value: Option<T>) {
    if let Some(v) = value {
        *field = v;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ap_mode_from_byte() {
        assert_eq!(ApMode::try_from(3).unwrap(), ApMode::Wind);
        assert!(matches!(ApMode::try_from(4), Err(N2kError::InvalidMode(4))));
    }

    #[test]
    fn test_absent_fields_unchanged() {
        let mut state = TelemetryState::new();
        state.apply(&TelemetryUpdate {
            battery_voltage: Some(12.6),
            engine_rpm: Some(1500),
            ..Default::default()
        });
        state.apply(&TelemetryUpdate {
            engine_rpm: Some(1600),
            ..Default::default()
        });
        assert_eq!(state.engine_rpm(), 1600);
        assert!((state.battery_voltage() - 12.6).abs() < 1e-9);
    }

    #[test]
    fn test_soc_mirrored_to_overview() {
        let mut state = TelemetryState::new();
        state.apply(&TelemetryUpdate {
            state_of_charge_pct: Some(87),
            ..Default::default()
        });
        assert_eq!(state.state_of_charge_pct(), 87);
        assert_eq!(state.soc_overview_pct(), 87);
    }

    #[test]
    fn test_first_heading_seeds_setpoint_once() {
        let mut state = TelemetryState::new();
        state.apply(&TelemetryUpdate {
            heading_deg: Some(42.0),
            ..Default::default()
        });
        assert_eq!(state.ap_setpoint_deg(), Some(42.0));

        state.apply(&TelemetryUpdate {
            heading_deg: Some(90.0),
            ..Default::default()
        });
        assert_eq!(state.heading_deg(), 90.0);
        assert_eq!(state.ap_setpoint_deg(), Some(42.0));
    }

    #[test]
    fn test_heading_does_not_seed_when_engaged() {
        let mut state = TelemetryState::new();
        state.apply(&TelemetryUpdate {
            ap_engaged: Some(true),
            ..Default::default()
        });
        state.apply(&TelemetryUpdate {
            heading_deg: Some(42.0),
            ..Default::default()
        });
        assert_eq!(state.ap_setpoint_deg(), None);
    }

    #[test]
    fn test_adjust_setpoint_wraps() {
        let mut state = TelemetryState::new();
        state.apply_command(&AutopilotCommand::new(true, ApMode::Heading, 355.0));
        let cmd = state.adjust_setpoint(10.0);
        assert!(cmd.engaged);
        assert_eq!(cmd.mode, ApMode::Heading);
        assert!((cmd.normalized_setpoint() - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_gear_bits() {
        assert_eq!(Gear::from_bits(0), Gear::Neutral);
        assert_eq!(Gear::from_bits(1), Gear::Drive);
        assert_eq!(Gear::from_bits(2), Gear::Reverse);
        assert_eq!(Gear::from_bits(3), Gear::Neutral);
        assert_eq!(Gear::from_bits(0xFD), Gear::Drive);
    }
}
