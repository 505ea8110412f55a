/// Size of the wire header in bytes.
pub const HEADER_SIZE: usize = 8;

/// Largest payload a single frame may carry.
pub const MAX_FRAME_SIZE: usize = 64 * 1024 * 1024;

/// Type tag for the payload that follows the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum MessageType {
    /// Serialized `WireMessage` (rkyv-encoded control message).
    Control = 0,
    /// Tagged collective payload: `[tag: u64 LE][bytes]`.
    RawData = 1,
}

impl MessageType {
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(MessageType::Control),
            1 => Some(MessageType::RawData),
            _ => None,
        }
    }
}

/// 8-byte wire header prepended to every framed message.
///
/// ```text
/// [0..4] payload_length: u32 LE
/// [4]    message_type: u8
/// [5..8] reserved (must be 0)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    /// Length of the payload following this header.
    pub payload_length: u32,
    /// Type of the payload.
    pub message_type: MessageType,
}

impl Header {
    /// Encode header to 8 bytes (little-endian).
    pub fn encode(&self) -> [u8; HEADER_SIZE] {
        let mut buf = [0u8; HEADER_SIZE];
        buf[0..4].copy_from_slice(&self.payload_length.to_le_bytes());
        buf[4] = self.message_type as u8;
        buf
    }

    /// Decode header from 8 bytes.
    ///
    /// Returns `None` if the message type byte is invalid.
    pub fn decode(buf: &[u8; HEADER_SIZE]) -> Option<Self> {
        let payload_length = u32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]);
        let message_type = MessageType::from_u8(buf[4])?;
        Some(Header {
            payload_length,
            message_type,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_roundtrip() {
        let h = Header {
            payload_length: 12345,
            message_type: MessageType::RawData,
        };
        let decoded = Header::decode(&h.encode()).unwrap();
        assert_eq!(h, decoded);
    }

    #[test]
    fn test_header_layout() {
        let h = Header {
            payload_length: 0x0102_0304,
            message_type: MessageType::Control,
        };
        assert_eq!(h.encode(), [0x04, 0x03, 0x02, 0x01, 0, 0, 0, 0]);
    }

    #[test]
    fn test_header_invalid_type() {
        let mut buf = [0u8; HEADER_SIZE];
        buf[4] = 7;
        assert!(Header::decode(&buf).is_none());
    }
}
