use crate::client::Communicator;
use crate::collective::helpers::{collective_recv, collective_send, expect_len};
use crate::error::Result;
use crate::types::ROOT_RANK;
use futures::future::try_join_all;

/// Two-phase barrier: blocks until all ranks reach this point.
///
/// Phase 1: every other rank sends an empty frame to rank 0.
/// Phase 2: rank 0 waits for all of them, then releases everyone.
///
/// Barrier frames are empty. A payload means the peer is running a
/// different collective under the same tag.
pub(crate) async fn barrier(client: &Communicator, tag: u64) -> Result<()> {
    let world = client.world_size();
    if world <= 1 {
        return Ok(());
    }

    if client.rank() == ROOT_RANK {
        for r in 1..world {
            let arrival = collective_recv(client, r, "barrier", tag).await?;
            expect_len(&arrival, 0)?;
        }
        let releases: Vec<_> = (1..world)
            .map(|r| collective_send(client, r, &[], "barrier", tag))
            .collect();
        try_join_all(releases).await?;
    } else {
        collective_send(client, ROOT_RANK, &[], "barrier", tag).await?;
        let release = collective_recv(client, ROOT_RANK, "barrier", tag).await?;
        expect_len(&release, 0)?;
    }

    Ok(())
}
