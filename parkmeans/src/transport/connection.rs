use crate::error::{ParkmeansError, Result};
use crate::protocol::WireMessage;
use crate::protocol::codec::{Frame, encode_message, encode_raw};
use crate::transport::{read_frame, write_frame};
use crate::types::Rank;
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::{Mutex, mpsc};

/// Inbox capacity per peer. Collectives consume frames in lockstep, so a
/// peer is never more than a couple of frames ahead.
const INBOX_CAPACITY: usize = 64;

/// A frame delivered by a peer, in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    Data { tag: u64, payload: Vec<u8> },
    Abort { reason: String },
}

/// A mesh connection to a single peer over one TCP stream.
///
/// The write half is shared behind a mutex so whole frames are never
/// interleaved. A background task reads frames off the read half and queues
/// them in the inbox; when the stream closes the inbox closes too and
/// receivers observe `PeerDisconnected`.
pub struct PeerConnection {
    rank: Rank,
    writer: Mutex<OwnedWriteHalf>,
    inbox: Mutex<mpsc::Receiver<Inbound>>,
    recv_handle: tokio::task::JoinHandle<()>,
}

impl PeerConnection {
    /// Wrap an established stream to `rank`. The mesh handshake must already be done.
    pub fn from_stream(rank: Rank, stream: TcpStream) -> Self {
        let (reader, writer) = stream.into_split();
        let (tx, rx) = mpsc::channel(INBOX_CAPACITY);
        let recv_handle = tokio::spawn(recv_loop(rank, reader, tx));

        Self {
            rank,
            writer: Mutex::new(writer),
            inbox: Mutex::new(rx),
            recv_handle,
        }
    }

    /// Rank of the remote end.
    pub fn rank(&self) -> Rank {
        self.rank
    }

    /// Send a tagged collective payload.
    pub async fn send_data(&self, tag: u64, data: &[u8]) -> Result<()> {
        let buf = encode_raw(tag, data)?;
        self.send_frame(&buf).await
    }

    /// Send a control message.
    pub async fn send_message(&self, msg: &WireMessage) -> Result<()> {
        let buf = encode_message(msg)?;
        self.send_frame(&buf).await
    }

    async fn send_frame(&self, buf: &[u8]) -> Result<()> {
        let mut writer = self.writer.lock().await;
        write_frame(&mut *writer, buf)
            .await
            .map_err(|e| ParkmeansError::ConnectionFailed {
                rank: self.rank,
                reason: e.to_string(),
            })
    }

    /// Wait for the next frame from this peer.
    pub async fn recv(&self) -> Result<Inbound> {
        self.inbox
            .lock()
            .await
            .recv()
            .await
            .ok_or(ParkmeansError::PeerDisconnected { rank: self.rank })
    }
}

impl Drop for PeerConnection {
    fn drop(&mut self) {
        self.recv_handle.abort();
    }
}

/// Background loop: decode frames and queue them for `recv`.
async fn recv_loop(rank: Rank, mut reader: OwnedReadHalf, tx: mpsc::Sender<Inbound>) {
    loop {
        let frame = match read_frame(&mut reader).await {
            Ok(frame) => frame,
            Err(e) => {
                tracing::debug!(peer = rank, "mesh recv loop ended: {e}");
                return;
            }
        };

        let inbound = match frame {
            Frame::Data { tag, payload } => Inbound::Data { tag, payload },
            Frame::Control(WireMessage::Abort { reason }) => Inbound::Abort { reason },
            Frame::Control(other) => {
                tracing::warn!(peer = rank, "ignoring unexpected control message: {other:?}");
                continue;
            }
        };

        let is_abort = matches!(inbound, Inbound::Abort { .. });
        if tx.send(inbound).await.is_err() || is_abort {
            return;
        }
    }
}
