//! NMEA2000 Bridge Error Types

use thiserror::Error;

/// Errors that can occur while talking to the CAN bridge
///
/// Malformed SLCAN lines and short payloads are not errors: they are dropped
/// by the parser and decoder and only show up in their statistics.
#[derive(Debug, Error)]
pub enum N2kError {
    /// Serial port could not be opened or configured
    #[error("Serial port error: {0}")]
    SerialError(String),

    /// Read or write on the byte stream failed
    #[error("Bridge I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The byte stream reached end-of-file
    #[error("CAN bridge closed the byte stream")]
    BridgeClosed,

    /// Autopilot mode value outside 0..=3
    #[error("Invalid autopilot mode {0}")]
    InvalidMode(u8),
}

impl From<tokio_serial::Error> for N2kError {
    fn from(err: tokio_serial::Error) -> Self {
        N2kError::SerialError(err.to_string())
    }
}
