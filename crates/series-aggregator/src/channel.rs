//! Logged Channels and Horizons

use n2k_protocol::TelemetryState;
use serde::{Deserialize, Serialize};

/// A telemetry quantity that can be logged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    SpeedThroughWater,
    EngineRpm,
    BatteryVoltage,
    BatteryCurrent,
    StateOfCharge,
    ApparentWindSpeed,
    ApparentWindAngle,
    TrueWindSpeed,
    TrueWindAngle,
    Heading,
    RudderAngle,
    CrossTrackError,
}

impl Channel {
    /// Every loggable channel
    pub const ALL: [Channel; 12] = [
        Channel::SpeedThroughWater,
        Channel::EngineRpm,
        Channel::BatteryVoltage,
        Channel::BatteryCurrent,
        Channel::StateOfCharge,
        Channel::ApparentWindSpeed,
        Channel::ApparentWindAngle,
        Channel::TrueWindSpeed,
        Channel::TrueWindAngle,
        Channel::Heading,
        Channel::RudderAngle,
        Channel::CrossTrackError,
    ];

    /// Stable name used for persistence
    pub fn name(&self) -> &'static str {
        match self {
            Channel::SpeedThroughWater => "speed_through_water",
            Channel::EngineRpm => "engine_rpm",
            Channel::BatteryVoltage => "battery_voltage",
            Channel::BatteryCurrent => "battery_current",
            Channel::StateOfCharge => "state_of_charge",
            Channel::ApparentWindSpeed => "apparent_wind_speed",
            Channel::ApparentWindAngle => "apparent_wind_angle",
            Channel::TrueWindSpeed => "true_wind_speed",
            Channel::TrueWindAngle => "true_wind_angle",
            Channel::Heading => "heading",
            Channel::RudderAngle => "rudder_angle",
            Channel::CrossTrackError => "cross_track_error",
        }
    }

    /// Current value of this channel in `state`
    pub fn read(&self, state: &TelemetryState) -> f64 {
        match self {
            Channel::SpeedThroughWater => state.speed_through_water_kts(),
            Channel::EngineRpm => state.engine_rpm() as f64,
            Channel::BatteryVoltage => state.battery_voltage(),
            Channel::BatteryCurrent => state.battery_current(),
            Channel::StateOfCharge => state.state_of_charge_pct() as f64,
            Channel::ApparentWindSpeed => state.apparent_wind_speed_ms(),
            Channel::ApparentWindAngle => state.apparent_wind_angle_deg(),
            Channel::TrueWindSpeed => state.true_wind_speed_ms(),
            Channel::TrueWindAngle => state.true_wind_angle_deg(),
            Channel::Heading => state.heading_deg(),
            Channel::RudderAngle => state.rudder_angle_deg(),
            Channel::CrossTrackError => state.cross_track_error_m(),
        }
    }
}

/// Retention tier of a series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Horizon {
    /// Time-gated raw samples
    Fine,
    /// Means of N₁ fine samples
    Medium,
    /// Means of N₂ medium points
    Coarse,
}

impl Horizon {
    pub const ALL: [Horizon; 3] = [Horizon::Fine, Horizon::Medium, Horizon::Coarse];

    pub fn label(&self) -> &'static str {
        match self {
            Horizon::Fine => "fine",
            Horizon::Medium => "medium",
            Horizon::Coarse => "coarse",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use n2k_protocol::TelemetryUpdate;

    #[test]
    fn test_names_unique() {
        let mut names: Vec<_> = Channel::ALL.iter().map(|c| c.name()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), Channel::ALL.len());
    }

    #[test]
    fn test_read_from_state() {
        let mut state = TelemetryState::new();
        state.apply(&TelemetryUpdate {
            engine_rpm: Some(2100),
            true_wind_speed_ms: Some(6.5),
            ..Default::default()
        });
        assert_eq!(Channel::EngineRpm.read(&state), 2100.0);
        assert_eq!(Channel::TrueWindSpeed.read(&state), 6.5);
        assert_eq!(Channel::BatteryVoltage.read(&state), 0.0);
    }
}
