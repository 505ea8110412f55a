use crate::cluster::topology::ClusterMap;
use crate::error::{ParkmeansError, Result};
use crate::protocol::WireMessage;
use crate::protocol::codec::{Frame, encode_message};
use crate::transport::{TransportListener, read_frame, write_frame};
use crate::types::{PROTOCOL_VERSION, Rank};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpStream;

/// The seed node orchestrates cluster formation.
///
/// It listens for incoming workers, assigns ranks in join order, and sends
/// every worker the full peer table once all of them have joined. The seed
/// takes no rank and does not participate in the computation.
pub struct SeedNode {
    listener: TransportListener,
    expected_world_size: u32,
    formation_timeout: Duration,
}

impl SeedNode {
    /// Create a seed node bound to the given address.
    pub async fn bind(addr: SocketAddr, expected_world_size: u32) -> Result<Self> {
        if expected_world_size == 0 {
            return Err(ParkmeansError::InvalidConfig(
                "world size must be at least 1".into(),
            ));
        }
        let listener = TransportListener::bind(addr).await?;
        Ok(Self {
            listener,
            expected_world_size,
            formation_timeout: Duration::from_secs(60),
        })
    }

    /// Set the cluster formation timeout.
    pub fn with_formation_timeout(mut self, timeout: Duration) -> Self {
        self.formation_timeout = timeout;
        self
    }

    /// Get the local address the seed is listening on.
    pub fn local_addr(&self) -> SocketAddr {
        self.listener.local_addr()
    }

    /// Wait for all expected workers to join and distribute the peer table.
    ///
    /// Workers get ranks `0..world_size` in the order their `Hello` arrives.
    pub async fn form_cluster(&self) -> Result<ClusterMap> {
        let mut map = ClusterMap::new();
        let mut joined: Vec<(Rank, TcpStream)> = Vec::new();
        let mut next_rank: Rank = 0;

        let deadline = tokio::time::Instant::now() + self.formation_timeout;

        while next_rank < self.expected_world_size {
            let (mut stream, remote) = tokio::select! {
                result = self.listener.accept() => result?,
                _ = tokio::time::sleep_until(deadline) => {
                    return Err(ParkmeansError::ClusterFormationTimeout {
                        joined: next_rank,
                        expected: self.expected_world_size,
                    });
                }
            };

            let hello = tokio::time::timeout_at(deadline, read_frame(&mut stream))
                .await
                .map_err(|_| ParkmeansError::ClusterFormationTimeout {
                    joined: next_rank,
                    expected: self.expected_world_size,
                })??;

            let listen_addr = match hello {
                Frame::Control(WireMessage::Hello {
                    protocol_version,
                    listen_addr,
                }) => {
                    if protocol_version != PROTOCOL_VERSION {
                        return Err(ParkmeansError::ProtocolMismatch {
                            local: PROTOCOL_VERSION,
                            remote: protocol_version,
                        });
                    }
                    listen_addr
                }
                other => {
                    return Err(ParkmeansError::DecodeFailed(format!(
                        "expected Hello, got {other:?}"
                    )));
                }
            };

            let rank = next_rank;
            map.add_peer(rank, reachable_addr(&listen_addr, remote));
            joined.push((rank, stream));
            next_rank += 1;

            tracing::info!(
                "worker joined: rank={rank}, total={next_rank}/{}",
                self.expected_world_size
            );
        }

        let peers = map.peers();
        for (rank, mut stream) in joined {
            let welcome = WireMessage::Welcome {
                rank,
                world_size: self.expected_world_size,
                peers: peers.clone(),
            };
            let buf = encode_message(&welcome)?;
            write_frame(&mut stream, &buf)
                .await
                .map_err(|e| ParkmeansError::ConnectionFailed {
                    rank,
                    reason: format!("send welcome: {e}"),
                })?;
        }

        Ok(map)
    }
}

/// A worker listening on a wildcard address is reachable at the IP it
/// connected from.
fn reachable_addr(advertised: &str, remote: SocketAddr) -> String {
    match advertised.parse::<SocketAddr>() {
        Ok(addr) if addr.ip().is_unspecified() => {
            SocketAddr::new(remote.ip(), addr.port()).to_string()
        }
        _ => advertised.to_string(),
    }
}
