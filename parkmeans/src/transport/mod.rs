mod connection;
mod listener;

pub use connection::{Inbound, PeerConnection};
pub use listener::TransportListener;
pub(crate) use listener::connect;

use crate::error::{ParkmeansError, Result};
use crate::protocol::codec::{Frame, decode_payload};
use crate::protocol::header::{HEADER_SIZE, Header, MAX_FRAME_SIZE};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Read one `[header][payload]` frame from a stream.
pub async fn read_frame<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Frame> {
    let mut header_buf = [0u8; HEADER_SIZE];
    reader
        .read_exact(&mut header_buf)
        .await
        .map_err(|e| ParkmeansError::transport_with_source("read frame header", e))?;
    let header = Header::decode(&header_buf).ok_or_else(|| {
        ParkmeansError::DecodeFailed("invalid header: unknown message type".into())
    })?;

    let len = header.payload_length as usize;
    if len > MAX_FRAME_SIZE {
        return Err(ParkmeansError::DecodeFailed(format!(
            "frame of {len} bytes exceeds the {MAX_FRAME_SIZE} byte limit"
        )));
    }

    let mut payload = vec![0u8; len];
    reader
        .read_exact(&mut payload)
        .await
        .map_err(|e| ParkmeansError::transport_with_source("read frame payload", e))?;

    decode_payload(&header, &payload)
}

/// Write an already-encoded frame and flush it.
pub async fn write_frame<W: AsyncWrite + Unpin>(writer: &mut W, frame: &[u8]) -> Result<()> {
    writer
        .write_all(frame)
        .await
        .map_err(|e| ParkmeansError::transport_with_source("write frame", e))?;
    writer
        .flush()
        .await
        .map_err(|e| ParkmeansError::transport_with_source("flush frame", e))?;
    Ok(())
}
