use crate::error::{ParkmeansError, Result};
use crate::protocol::WireMessage;
use crate::protocol::codec::{Frame, encode_message};
use crate::transport::{TransportListener, connect, read_frame, write_frame};
use crate::types::{PROTOCOL_VERSION, Rank};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpStream;

/// Delay between attempts while the seed is not yet accepting.
const CONNECT_RETRY_INTERVAL: Duration = Duration::from_millis(100);

/// Result of connecting to the seed node and completing the handshake.
pub struct WorkerNode {
    pub rank: Rank,
    pub world_size: u32,
    /// Mesh addresses of all workers in rank order, including this one.
    pub peers: Vec<(Rank, String)>,
    /// Mesh listener that higher ranks will connect to.
    pub listener: TransportListener,
}

impl WorkerNode {
    /// Bind the mesh listener, connect to the seed, and receive a rank assignment.
    ///
    /// Connection attempts are retried until `timeout` elapses so workers may
    /// be started before the seed.
    pub async fn connect(
        seed_addr: SocketAddr,
        listen_addr: SocketAddr,
        timeout: Duration,
    ) -> Result<Self> {
        let listener = TransportListener::bind(listen_addr).await?;
        let deadline = tokio::time::Instant::now() + timeout;

        let mut stream = connect_with_retry(seed_addr, deadline).await?;

        let hello = WireMessage::Hello {
            protocol_version: PROTOCOL_VERSION,
            listen_addr: listener.local_addr().to_string(),
        };
        write_frame(&mut stream, &encode_message(&hello)?).await?;

        // The seed replies only once every worker has joined.
        let welcome = tokio::time::timeout_at(deadline, read_frame(&mut stream))
            .await
            .map_err(|_| ParkmeansError::ConnectionFailed {
                rank: 0,
                reason: format!("no welcome from seed {seed_addr} within {timeout:?}"),
            })??;

        match welcome {
            Frame::Control(WireMessage::Welcome {
                rank,
                world_size,
                peers,
            }) => {
                tracing::debug!(rank, world_size, "received rank assignment");
                Ok(WorkerNode {
                    rank,
                    world_size,
                    peers,
                    listener,
                })
            }
            other => Err(ParkmeansError::DecodeFailed(format!(
                "expected Welcome, got {other:?}"
            ))),
        }
    }
}

async fn connect_with_retry(
    addr: SocketAddr,
    deadline: tokio::time::Instant,
) -> Result<TcpStream> {
    loop {
        match connect(addr).await {
            Ok(stream) => return Ok(stream),
            Err(e) if tokio::time::Instant::now() + CONNECT_RETRY_INTERVAL < deadline => {
                tracing::trace!("seed {addr} not reachable yet: {e}");
                tokio::time::sleep(CONNECT_RETRY_INTERVAL).await;
            }
            Err(e) => {
                return Err(ParkmeansError::ConnectionFailed {
                    rank: 0,
                    reason: format!("seed {addr}: {e}"),
                });
            }
        }
    }
}
