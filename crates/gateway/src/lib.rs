//! NMEA2000 Telemetry Gateway
//!
//! Reads SLCAN frames from a serial CAN bridge, keeps the decoded boat
//! state, logs selected channels at three time resolutions and sends
//! autopilot commands back onto the bus.

pub mod config;
mod gateway;
mod operator;

pub use config::{ConfigError, GatewayConfig};
pub use gateway::{run, Gateway};
pub use operator::{spawn_operator_reader, OperatorCommand, OperatorParseError};

use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Initialize logging.
///
/// `RUST_LOG` wins over `default_level` when set.
pub fn init_logging(default_level: &str) -> Result<(), tracing::subscriber::SetGlobalDefaultError> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
}
