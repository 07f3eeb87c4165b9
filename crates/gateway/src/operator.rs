//! Operator commands
//!
//! A tiny line grammar for driving the autopilot from a terminal:
//!
//! ```text
//! engage [heading|track|wind]
//! standby
//! set <degrees>
//! adjust <delta> | +<delta> | -<delta>
//! ```

use n2k_protocol::{ApMode, AutopilotCommand, TelemetryState};
use std::io::BufRead;
use std::str::FromStr;
use std::thread;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OperatorParseError {
    #[error("empty command")]
    Empty,
    #[error("unknown command '{0}'")]
    Unknown(String),
    #[error("unknown autopilot mode '{0}'")]
    Mode(String),
    #[error("'{0}' is not a number of degrees")]
    Degrees(String),
}

/// Operator intent for the autopilot
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OperatorCommand {
    /// Engage in the given mode, holding the current setpoint
    Engage(ApMode),
    /// Disengage
    Standby,
    /// Replace the setpoint
    Set(f64),
    /// Move the setpoint by a delta
    Adjust(f64),
}

impl OperatorCommand {
    /// Resolve against the current state into a wire command
    pub fn resolve(&self, state: &TelemetryState) -> AutopilotCommand {
        let setpoint = state.ap_setpoint_deg().unwrap_or(state.heading_deg());
        match *self {
            OperatorCommand::Engage(mode) => AutopilotCommand::new(true, mode, setpoint),
            OperatorCommand::Standby => AutopilotCommand::new(false, ApMode::Standby, setpoint),
            OperatorCommand::Set(deg) => {
                AutopilotCommand::new(state.ap_engaged(), state.ap_mode(), deg)
            }
            OperatorCommand::Adjust(delta) => state.adjust_setpoint(delta),
        }
    }
}

fn parse_degrees(s: &str) -> Result<f64, OperatorParseError> {
    s.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| OperatorParseError::Degrees(s.to_string()))
}

impl FromStr for OperatorCommand {
    type Err = OperatorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut words = s.split_whitespace();
        let verb = words.next().ok_or(OperatorParseError::Empty)?;
        let arg = words.next();

        if verb.starts_with('+') || verb.starts_with('-') {
            return parse_degrees(verb).map(OperatorCommand::Adjust);
        }

        match (verb.to_ascii_lowercase().as_str(), arg) {
            ("engage", None) => Ok(OperatorCommand::Engage(ApMode::Heading)),
            ("engage", Some(mode)) => match mode.to_ascii_lowercase().as_str() {
                "heading" => Ok(OperatorCommand::Engage(ApMode::Heading)),
                "track" => Ok(OperatorCommand::Engage(ApMode::Track)),
                "wind" => Ok(OperatorCommand::Engage(ApMode::Wind)),
                _ => Err(OperatorParseError::Mode(mode.to_string())),
            },
            ("standby", _) => Ok(OperatorCommand::Standby),
            ("set", Some(deg)) => parse_degrees(deg).map(OperatorCommand::Set),
            ("adjust", Some(delta)) => parse_degrees(delta).map(OperatorCommand::Adjust),
            _ => Err(OperatorParseError::Unknown(s.trim().to_string())),
        }
    }
}

/// Read operator lines on a dedicated thread and forward parsed commands.
///
/// The thread lives outside the async runtime, so a blocked read never
/// holds up runtime shutdown. It ends on EOF, on a read error, or once the
/// receiver is dropped.
pub fn spawn_operator_reader<R>(
    input: R,
    tx: mpsc::Sender<OperatorCommand>,
) -> thread::JoinHandle<()>
where
    R: BufRead + Send + 'static,
{
    thread::spawn(move || {
        for line in input.lines() {
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    warn!("Operator input: {}", e);
                    break;
                }
            };
            if line.trim().is_empty() {
                continue;
            }
            match line.parse::<OperatorCommand>() {
                Ok(command) => {
                    if tx.blocking_send(command).is_err() {
                        break;
                    }
                }
                Err(e) => warn!("{}", e),
            }
        }
        debug!("Operator input closed");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use n2k_protocol::TelemetryUpdate;
    use std::io::{BufReader, Cursor, Read};
    use std::time::{Duration, Instant};

    /// Input that blocks until its sender is dropped
    struct HeldOpen(std::sync::mpsc::Receiver<()>);

    impl Read for HeldOpen {
        fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
            let _ = self.0.recv();
            Ok(0)
        }
    }

    #[test]
    fn test_parse() {
        assert_eq!("engage".parse::<OperatorCommand>(), Ok(OperatorCommand::Engage(ApMode::Heading)));
        assert_eq!("ENGAGE wind".parse::<OperatorCommand>(), Ok(OperatorCommand::Engage(ApMode::Wind)));
        assert_eq!("standby".parse::<OperatorCommand>(), Ok(OperatorCommand::Standby));
        assert_eq!("set 181".parse::<OperatorCommand>(), Ok(OperatorCommand::Set(181.0)));
        assert_eq!("+10".parse::<OperatorCommand>(), Ok(OperatorCommand::Adjust(10.0)));
        assert_eq!("-1".parse::<OperatorCommand>(), Ok(OperatorCommand::Adjust(-1.0)));
        assert_eq!("adjust -5".parse::<OperatorCommand>(), Ok(OperatorCommand::Adjust(-5.0)));
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!("".parse::<OperatorCommand>(), Err(OperatorParseError::Empty));
        assert!(matches!(
            "engage sideways".parse::<OperatorCommand>(),
            Err(OperatorParseError::Mode(_))
        ));
        assert!(matches!(
            "set north".parse::<OperatorCommand>(),
            Err(OperatorParseError::Degrees(_))
        ));
        assert!(matches!(
            "jibe".parse::<OperatorCommand>(),
            Err(OperatorParseError::Unknown(_))
        ));
    }

    #[test]
    fn test_engage_holds_seeded_setpoint() {
        let mut state = TelemetryState::new();
        state.apply(&TelemetryUpdate {
            heading_deg: Some(123.0),
            ..Default::default()
        });
        let cmd = OperatorCommand::Engage(ApMode::Heading).resolve(&state);
        assert!(cmd.engaged);
        assert_eq!(cmd.setpoint_deg, 123.0);
    }

    #[test]
    fn test_set_keeps_mode() {
        let mut state = TelemetryState::new();
        state.apply_command(&AutopilotCommand::new(true, ApMode::Track, 10.0));
        let cmd = OperatorCommand::Set(200.0).resolve(&state);
        assert!(cmd.engaged);
        assert_eq!(cmd.mode, ApMode::Track);
        assert_eq!(cmd.setpoint_deg, 200.0);
    }

    #[test]
    fn test_reader_forwards_parsed_lines() {
        let (tx, mut rx) = mpsc::channel(8);
        let input = Cursor::new("engage track\n\njibe\n+5\n");
        spawn_operator_reader(input, tx).join().unwrap();

        assert_eq!(rx.blocking_recv(), Some(OperatorCommand::Engage(ApMode::Track)));
        assert_eq!(rx.blocking_recv(), Some(OperatorCommand::Adjust(5.0)));
        assert_eq!(rx.blocking_recv(), None);
    }

    #[test]
    fn test_runtime_shutdown_with_input_held_open() {
        let (hold, held) = std::sync::mpsc::channel::<()>();
        let rt = tokio::runtime::Runtime::new().unwrap();
        let (tx, mut rx) = mpsc::channel(1);
        let reader = spawn_operator_reader(BufReader::new(HeldOpen(held)), tx);
        rt.spawn(async move { while rx.recv().await.is_some() {} });

        let started = Instant::now();
        drop(rt);
        assert!(started.elapsed() < Duration::from_secs(1));

        drop(hold);
        reader.join().unwrap();
    }
}
