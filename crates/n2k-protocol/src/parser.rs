//! Resynchronizing SLCAN Line Parser
//!
//! Bytes are pushed in whatever chunks the transport delivers. A line ends at
//! `\r` or `\n`; consecutive terminators collapse. Only extended data frames
//! (`T` + 8 id digits + length digit + `2 * len` data digits) are accepted,
//! everything else is dropped without surfacing an error.

use crate::frame::{CanFrame, MAX_DATA_LEN};
use tracing::debug;

/// Capacity of the line accumulation buffer.
///
/// The longest valid line is 26 characters; anything reaching this size is
/// noise.
pub const LINE_CAPACITY: usize = 64;

const ID_DIGITS: usize = 8;
const HEADER_LEN: usize = 1 + ID_DIGITS + 1;

/// Counters kept by the parser
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParserStats {
    /// Valid frames emitted
    pub frames: u64,
    /// Terminated lines that failed validation
    pub rejected_lines: u64,
    /// Partial lines discarded because the buffer filled up
    pub overflows: u64,
}

/// Incremental SLCAN parser
#[derive(Debug, Clone)]
pub struct SlcanParser {
    line: [u8; LINE_CAPACITY],
    cursor: usize,
    /// Set after an overflow; bytes are skipped until the next terminator.
    discarding: bool,
    stats: ParserStats,
}

impl SlcanParser {
    /// Create a parser with an empty line buffer
    pub fn new() -> Self {
        Self {
            line: [0; LINE_CAPACITY],
            cursor: 0,
            discarding: false,
            stats: ParserStats::default(),
        }
    }

    /// Push a chunk of bytes, returning every frame completed by it, in
    /// stream order.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<CanFrame> {
        bytes.iter().filter_map(|&b| self.push_byte(b)).collect()
    }

    /// Push a single byte. Returns a frame when the byte terminates a valid
    /// line.
    pub fn push_byte(&mut self, byte: u8) -> Option<CanFrame> {
        if byte == b'\r' || byte == b'\n' {
            return self.terminate();
        }

        if self.discarding {
            return None;
        }

        if self.cursor == LINE_CAPACITY {
            debug!("SLCAN line exceeded {} bytes, resynchronizing", LINE_CAPACITY);
            self.stats.overflows += 1;
            self.cursor = 0;
            self.discarding = true;
            return None;
        }

        self.line[self.cursor] = byte;
        self.cursor += 1;
        None
    }

    /// Number of bytes of the current, unterminated line
    pub fn pending(&self) -> usize {
        self.cursor
    }

    /// Parser counters
    pub fn stats(&self) -> ParserStats {
        self.stats
    }

    /// Drop any partial line
    pub fn reset(&mut self) {
        self.cursor = 0;
        self.discarding = false;
    }

    fn terminate(&mut self) -> Option<CanFrame> {
        let len = self.cursor;
        self.reset();
        if len == 0 {
            return None;
        }

        match parse_line(&self.line[..len]) {
            Some(frame) => {
                self.stats.frames += 1;
                Some(frame)
            }
            None => {
                debug!(
                    "Dropping malformed SLCAN line {:?}",
                    String::from_utf8_lossy(&self.line[..len])
                );
                self.stats.rejected_lines += 1;
                None
            }
        }
    }
}

impl Default for SlcanParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse one unterminated SLCAN line
fn parse_line(line: &[u8]) -> Option<CanFrame> {
    if line.len() < HEADER_LEN || line[0] != b'T' {
        return None;
    }

    let mut id = 0u32;
    for &c in &line[1..=ID_DIGITS] {
        id = (id << 4) | hex_value(c)? as u32;
    }

    let len = hex_value(line[HEADER_LEN - 1])? as usize;
    if len > MAX_DATA_LEN || line.len() != HEADER_LEN + len * 2 {
        return None;
    }

    let mut data = [0u8; MAX_DATA_LEN];
    for (i, pair) in line[HEADER_LEN..].chunks_exact(2).enumerate() {
        data[i] = (hex_value(pair[0])? << 4) | hex_value(pair[1])?;
    }

    CanFrame::new(id, &data[..len])
}

fn hex_value(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'A'..=b'F' => Some(c - b'A' + 10),
        b'a'..=b'f' => Some(c - b'a' + 10),
        _ => None,
    }
}
