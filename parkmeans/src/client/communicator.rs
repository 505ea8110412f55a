use crate::config::ParkmeansConfig;
use crate::error::{ParkmeansError, Result};
use crate::protocol::WireMessage;
use crate::transport::{Inbound, PeerConnection};
use crate::types::{ROOT_RANK, Rank};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Upper bound on delivering an abort notice to one peer.
const ABORT_SEND_TIMEOUT: Duration = Duration::from_secs(2);

/// One rank's endpoint in a fully connected worker mesh.
///
/// Every collective draws a fresh sequence tag from a per-communicator
/// counter. All ranks issue collectives in the same order, so their counters
/// advance in lockstep and a frame carrying any other tag means some rank
/// is out of step.
///
/// # Example
///
/// ```no_run
/// use parkmeans::{Communicator, ParkmeansConfig};
///
/// # async fn example() -> parkmeans::Result<()> {
/// let comms = Communicator::bootstrap_local(4, ParkmeansConfig::default()).await?;
///
/// // Each communicator has a unique rank in [0, world_size).
/// assert_eq!(comms[0].rank(), 0);
/// assert_eq!(comms[0].world_size(), 4);
/// # Ok(())
/// # }
/// ```
pub struct Communicator {
    pub(super) rank: Rank,
    pub(super) world_size: u32,
    /// One connection per remote rank.
    pub(super) peers: HashMap<Rank, PeerConnection>,
    pub(super) config: ParkmeansConfig,
    /// Next collective sequence tag. Tag 0 is never issued.
    pub(super) collective_seq: AtomicU64,
}

impl Communicator {
    /// Create a communicator from pre-established peer connections.
    pub fn new(
        rank: Rank,
        world_size: u32,
        peers: HashMap<Rank, PeerConnection>,
        config: ParkmeansConfig,
    ) -> Self {
        Self {
            rank,
            world_size,
            peers,
            config,
            collective_seq: AtomicU64::new(1),
        }
    }

    /// This communicator's rank (0-indexed).
    pub fn rank(&self) -> Rank {
        self.rank
    }

    /// Total number of ranks.
    pub fn world_size(&self) -> u32 {
        self.world_size
    }

    /// Whether this rank is the one that loads data and reports.
    pub fn is_root(&self) -> bool {
        self.rank == ROOT_RANK
    }

    pub fn config(&self) -> &ParkmeansConfig {
        &self.config
    }

    /// Get the connection to a peer.
    pub fn peer(&self, rank: Rank) -> Result<&PeerConnection> {
        self.peers
            .get(&rank)
            .ok_or(ParkmeansError::UnknownPeer { rank })
    }

    /// Draw the tag for the next collective.
    pub(crate) fn next_tag(&self) -> u64 {
        self.collective_seq.fetch_add(1, Ordering::Relaxed)
    }

    /// Reject ranks outside `[0, world_size)`.
    pub(crate) fn check_rank(&self, rank: Rank) -> Result<()> {
        if rank >= self.world_size {
            return Err(ParkmeansError::InvalidRank {
                rank,
                world_size: self.world_size,
            });
        }
        Ok(())
    }

    /// Send tagged bytes to a peer.
    pub async fn send_bytes(&self, dest: Rank, tag: u64, data: &[u8]) -> Result<()> {
        self.peer(dest)?.send_data(tag, data).await
    }

    /// Receive the next frame from `src`, which must carry `tag`.
    pub async fn recv_bytes(&self, src: Rank, tag: u64) -> Result<Vec<u8>> {
        match self.peer(src)?.recv().await? {
            Inbound::Data {
                tag: recv_tag,
                payload,
            } => {
                if recv_tag != tag {
                    return Err(ParkmeansError::DecodeFailed(format!(
                        "out of step with rank {src}: expected tag {tag}, got {recv_tag}"
                    )));
                }
                Ok(payload)
            }
            Inbound::Abort { reason } => Err(ParkmeansError::Aborted { rank: src, reason }),
        }
    }

    /// Tell every peer to stop.
    ///
    /// Delivery is best effort: peers that already went away are skipped.
    /// Ranks blocked on a receive from this rank fail with
    /// [`ParkmeansError::Aborted`]; the rest notice when their own
    /// collectives break.
    pub async fn abort(&self, reason: &str) {
        tracing::error!(rank = self.rank, "aborting computation: {reason}");

        let msg = WireMessage::Abort {
            reason: reason.to_string(),
        };
        let sends = self.peers.values().map(|peer| {
            let msg = &msg;
            async move {
                match tokio::time::timeout(ABORT_SEND_TIMEOUT, peer.send_message(msg)).await {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => {
                        tracing::warn!(peer = peer.rank(), "abort not delivered: {e}")
                    }
                    Err(_) => tracing::warn!(peer = peer.rank(), "abort delivery timed out"),
                }
            }
        });
        futures::future::join_all(sends).await;
    }
}
