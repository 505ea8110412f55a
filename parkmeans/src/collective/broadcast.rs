use crate::client::Communicator;
use crate::collective::helpers::{collective_recv, collective_send, expect_len};
use crate::error::Result;
use crate::types::Rank;
use futures::future::try_join_all;

/// Threshold: use flat broadcast for small worlds, tree broadcast for larger.
const TREE_BROADCAST_THRESHOLD: u32 = 4;

/// Broadcast `buf` from `root` to every rank.
///
/// Uses a binary tree over ranks remapped so that root is logical rank 0.
/// Falls back to flat broadcast (root sends to all directly) for world sizes
/// below `TREE_BROADCAST_THRESHOLD`. Every rank ends up with root's exact
/// bytes.
pub(crate) async fn tree_broadcast(
    client: &Communicator,
    buf: &mut [u8],
    root: Rank,
    tag: u64,
) -> Result<()> {
    let world = client.world_size();

    if world <= 1 {
        return Ok(());
    }

    if world < TREE_BROADCAST_THRESHOLD {
        return flat_broadcast(client, buf, root, tag).await;
    }

    let rank = client.rank();

    // Remap ranks so root becomes logical rank 0.
    let logical = |r: Rank| -> Rank { (r + world - root) % world };
    let physical = |l: Rank| -> Rank { (l + root) % world };
    let my_logical = logical(rank);

    if my_logical != 0 {
        let parent = physical((my_logical - 1) / 2);
        let received = collective_recv(client, parent, "broadcast", tag).await?;
        expect_len(&received, buf.len())?;
        buf.copy_from_slice(&received);
    }

    // Send to children concurrently.
    let data: &[u8] = buf;
    let futs: Vec<_> = [2 * my_logical + 1, 2 * my_logical + 2]
        .into_iter()
        .filter(|&child| child < world)
        .map(|child| collective_send(client, physical(child), data, "broadcast", tag))
        .collect();

    if !futs.is_empty() {
        try_join_all(futs).await?;
    }

    Ok(())
}

/// Flat broadcast: root sends to all other ranks concurrently.
async fn flat_broadcast(
    client: &Communicator,
    buf: &mut [u8],
    root: Rank,
    tag: u64,
) -> Result<()> {
    let world = client.world_size();
    let rank = client.rank();

    if rank == root {
        let data: &[u8] = buf;
        let futs: Vec<_> = (0..world)
            .filter(|&r| r != root)
            .map(|r| collective_send(client, r, data, "broadcast", tag))
            .collect();
        try_join_all(futs).await?;
    } else {
        let received = collective_recv(client, root, "broadcast", tag).await?;
        expect_len(&received, buf.len())?;
        buf.copy_from_slice(&received);
    }

    Ok(())
}
