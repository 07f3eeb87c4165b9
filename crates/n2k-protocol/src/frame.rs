//! CAN Frame Representation

use std::fmt::Write as _;

/// Maximum payload of a classic CAN frame
pub const MAX_DATA_LEN: usize = 8;

/// Mask for a 29-bit extended identifier
pub const EXTENDED_ID_MASK: u32 = 0x1FFF_FFFF;

/// A classic CAN frame with a 29-bit identifier
///
/// Only frames that passed validation are ever constructed, so there is no
/// separate validity flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CanFrame {
    id: u32,
    len: u8,
    data: [u8; MAX_DATA_LEN],
}

impl CanFrame {
    /// Build a frame from an identifier and up to 8 payload bytes.
    ///
    /// Returns `None` if the payload is longer than 8 bytes. Identifier bits
    /// above bit 28 are discarded.
    pub fn new(id: u32, payload: &[u8]) -> Option<Self> {
        if payload.len() > MAX_DATA_LEN {
            return None;
        }
        let mut data = [0u8; MAX_DATA_LEN];
        data[..payload.len()].copy_from_slice(payload);
        Some(Self {
            id: id & EXTENDED_ID_MASK,
            len: payload.len() as u8,
            data,
        })
    }

    /// 29-bit identifier
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Number of meaningful payload bytes (0-8)
    pub fn len(&self) -> usize {
        self.len as usize
    }

    /// True when the frame carries no payload
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The meaningful payload bytes
    pub fn payload(&self) -> &[u8] {
        &self.data[..self.len as usize]
    }

    /// Full 8-byte data array (bytes past `len()` are zero)
    pub fn data(&self) -> [u8; MAX_DATA_LEN] {
        self.data
    }

    /// Serialize as an SLCAN extended-frame line: `T` + 8 hex id digits +
    /// length digit + data hex pairs + `\r`.
    pub fn to_slcan_line(&self) -> String {
        let mut line = String::with_capacity(11 + self.len() * 2);
        let _ = write!(line, "T{:08X}{}", self.id, self.len);
        for byte in self.payload() {
            let _ = write!(line, "{:02X}", byte);
        }
        line.push('\r');
        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_oversized_payload() {
        assert!(CanFrame::new(0x100, &[0; 9]).is_none());
    }

    #[test]
    fn test_id_masked_to_29_bits() {
        let frame = CanFrame::new(0xFFFF_FFFF, &[]).unwrap();
        assert_eq!(frame.id(), 0x1FFF_FFFF);
        assert!(frame.is_empty());
    }

    #[test]
    fn test_slcan_line_format() {
        let frame = CanFrame::new(0x1823FF00, &[0x27, 0x10]).unwrap();
        assert_eq!(frame.to_slcan_line(), "T1823FF0022710\r");
    }

    #[test]
    fn test_payload_zero_padded() {
        let frame = CanFrame::new(0x1, &[0xAB]).unwrap();
        assert_eq!(frame.data(), [0xAB, 0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(frame.payload(), &[0xAB]);
    }
}
