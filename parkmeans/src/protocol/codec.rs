use crate::error::{ParkmeansError, Result};
use crate::protocol::header::{HEADER_SIZE, Header, MAX_FRAME_SIZE, MessageType};
use crate::protocol::message::WireMessage;

/// A decoded frame payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    Control(WireMessage),
    Data { tag: u64, payload: Vec<u8> },
}

/// Encode a `WireMessage` into a framed byte buffer: `[header][rkyv payload]`.
pub fn encode_message(msg: &WireMessage) -> Result<Vec<u8>> {
    let payload = rkyv::to_bytes::<rkyv::rancor::Error>(msg)
        .map_err(|e| ParkmeansError::EncodeFailed(e.to_string()))?;
    frame(MessageType::Control, &[], &payload)
}

/// Encode a tagged collective payload: `[header][tag: u64 LE][bytes]`.
pub fn encode_raw(tag: u64, data: &[u8]) -> Result<Vec<u8>> {
    frame(MessageType::RawData, &tag.to_le_bytes(), data)
}

fn frame(message_type: MessageType, prefix: &[u8], payload: &[u8]) -> Result<Vec<u8>> {
    let len = prefix.len() + payload.len();
    if len > MAX_FRAME_SIZE {
        return Err(ParkmeansError::EncodeFailed(format!(
            "payload of {len} bytes exceeds the {MAX_FRAME_SIZE} byte frame limit"
        )));
    }

    let header = Header {
        payload_length: len as u32,
        message_type,
    };

    let mut buf = Vec::with_capacity(HEADER_SIZE + len);
    buf.extend_from_slice(&header.encode());
    buf.extend_from_slice(prefix);
    buf.extend_from_slice(payload);
    Ok(buf)
}

/// Decode the payload that followed `header` on the wire.
pub fn decode_payload(header: &Header, payload: &[u8]) -> Result<Frame> {
    if payload.len() != header.payload_length as usize {
        return Err(ParkmeansError::DecodeFailed(format!(
            "payload length {} does not match header length {}",
            payload.len(),
            header.payload_length
        )));
    }

    match header.message_type {
        MessageType::Control => {
            // rkyv validates alignment, and the payload may sit at any offset.
            let mut aligned = rkyv::util::AlignedVec::<16>::with_capacity(payload.len());
            aligned.extend_from_slice(payload);
            let msg = rkyv::from_bytes::<WireMessage, rkyv::rancor::Error>(&aligned)
                .map_err(|e| ParkmeansError::DecodeFailed(e.to_string()))?;
            Ok(Frame::Control(msg))
        }
        MessageType::RawData => {
            if payload.len() < 8 {
                return Err(ParkmeansError::DecodeFailed(format!(
                    "raw frame too short for tag: {} < 8",
                    payload.len()
                )));
            }
            let mut tag_bytes = [0u8; 8];
            tag_bytes.copy_from_slice(&payload[..8]);
            Ok(Frame::Data {
                tag: u64::from_le_bytes(tag_bytes),
                payload: payload[8..].to_vec(),
            })
        }
    }
}
