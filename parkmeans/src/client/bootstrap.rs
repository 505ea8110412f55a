use crate::client::Communicator;
use crate::cluster::{SeedNode, WorkerNode};
use crate::config::ParkmeansConfig;
use crate::error::{ParkmeansError, Result};
use crate::protocol::WireMessage;
use crate::protocol::codec::{Frame, encode_message};
use crate::transport::{PeerConnection, TransportListener, connect, read_frame, write_frame};
use crate::types::Rank;
use futures::future::try_join_all;
use std::collections::HashMap;
use std::net::SocketAddr;

impl Communicator {
    /// Bootstrap a cluster: start a seed node and connect workers.
    ///
    /// This is a convenience for tests and single-host runs where all
    /// workers live in the same process (each as a tokio task). The mesh
    /// still runs over loopback TCP, exactly as it would across processes.
    pub async fn bootstrap_local(
        world_size: u32,
        config: ParkmeansConfig,
    ) -> Result<Vec<Communicator>> {
        let loopback = SocketAddr::from(([127, 0, 0, 1], 0));
        let seed = SeedNode::bind(loopback, world_size)
            .await?
            .with_formation_timeout(config.formation_timeout);
        let seed_addr = seed.local_addr();

        let seed_handle = tokio::spawn(async move { seed.form_cluster().await });

        let mut worker_handles = Vec::new();
        for _ in 0..world_size {
            let config = config.clone();
            worker_handles.push(tokio::spawn(async move {
                let worker =
                    WorkerNode::connect(seed_addr, loopback, config.formation_timeout).await?;
                Communicator::join(worker, config).await
            }));
        }

        seed_handle
            .await
            .map_err(|e| ParkmeansError::transport_with_source("seed task panicked", e))??;

        let mut comms = Vec::with_capacity(world_size as usize);
        for h in worker_handles {
            let joined = h
                .await
                .map_err(|e| ParkmeansError::transport_with_source("worker task panicked", e))?;
            comms.push(joined?);
        }
        comms.sort_by_key(|c| c.rank());

        Ok(comms)
    }

    /// Build this worker's side of the full mesh.
    ///
    /// For each pair (i, j) with i < j, rank j connects to rank i's listener
    /// and introduces itself with `MeshHello`. Every worker therefore dials
    /// all lower ranks and accepts from all higher ranks.
    pub async fn join(worker: WorkerNode, config: ParkmeansConfig) -> Result<Communicator> {
        let WorkerNode {
            rank,
            world_size,
            peers,
            listener,
        } = worker;

        if peers.len() != world_size as usize {
            return Err(ParkmeansError::DecodeFailed(format!(
                "peer table has {} entries for world size {world_size}",
                peers.len()
            )));
        }

        let addrs: HashMap<Rank, String> = peers.into_iter().collect();
        let expected_incoming = (world_size - 1 - rank) as usize;

        let mesh = async {
            tokio::try_join!(
                accept_higher(&listener, rank, world_size, expected_incoming),
                dial_lower(rank, &addrs),
            )
        };
        let (incoming, outgoing) = tokio::time::timeout(config.formation_timeout, mesh)
            .await
            .map_err(|_| {
                ParkmeansError::transport(format!(
                    "rank {rank}: mesh not established within {:?}",
                    config.formation_timeout
                ))
            })??;

        let mut conns = HashMap::with_capacity(world_size as usize);
        for conn in incoming.into_iter().chain(outgoing) {
            conns.insert(conn.rank(), conn);
        }

        tracing::info!(rank, world_size, "mesh established");
        Ok(Communicator::new(rank, world_size, conns, config))
    }
}

/// Accept one connection from every rank above `rank`.
async fn accept_higher(
    listener: &TransportListener,
    rank: Rank,
    world_size: u32,
    expected: usize,
) -> Result<Vec<PeerConnection>> {
    let mut conns: Vec<PeerConnection> = Vec::with_capacity(expected);
    while conns.len() < expected {
        let (mut stream, remote) = listener.accept().await?;
        let peer_rank = match read_frame(&mut stream).await? {
            Frame::Control(WireMessage::MeshHello { rank: r }) => r,
            other => {
                return Err(ParkmeansError::DecodeFailed(format!(
                    "expected MeshHello from {remote}, got {other:?}"
                )));
            }
        };

        if peer_rank <= rank || peer_rank >= world_size {
            return Err(ParkmeansError::InvalidRank {
                rank: peer_rank,
                world_size,
            });
        }
        if conns.iter().any(|c| c.rank() == peer_rank) {
            return Err(ParkmeansError::ConnectionFailed {
                rank: peer_rank,
                reason: "duplicate mesh connection".into(),
            });
        }

        tracing::trace!(rank, peer_rank, "accepted mesh connection");
        conns.push(PeerConnection::from_stream(peer_rank, stream));
    }
    Ok(conns)
}

/// Connect to every rank below `rank`.
async fn dial_lower(rank: Rank, addrs: &HashMap<Rank, String>) -> Result<Vec<PeerConnection>> {
    let dials = (0..rank).map(|peer_rank| async move {
        let addr: SocketAddr = addrs
            .get(&peer_rank)
            .ok_or(ParkmeansError::UnknownPeer { rank: peer_rank })?
            .parse()
            .map_err(|e| ParkmeansError::ConnectionFailed {
                rank: peer_rank,
                reason: format!("bad mesh address: {e}"),
            })?;

        let mut stream = connect(addr).await?;
        write_frame(&mut stream, &encode_message(&WireMessage::MeshHello { rank })?).await?;
        Ok::<_, ParkmeansError>(PeerConnection::from_stream(peer_rank, stream))
    });
    try_join_all(dials).await
}
