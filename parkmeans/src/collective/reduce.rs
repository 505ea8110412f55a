use crate::client::Communicator;
use crate::collective::helpers::{collective_recv, collective_send, expect_len};
use crate::error::Result;
use crate::reduce::{Element, reduce_slice};
use crate::types::{Rank, ReduceOp};

/// Tree reduce: reduce data from all ranks to a single root rank.
///
/// Uses a binomial tree with O(log N) steps. Non-power-of-2 world sizes are
/// handled by first folding the excess ranks into the lower power-of-2 set.
///
/// The combination order depends only on the world size and root, never on
/// message arrival order, so floating-point results are reproducible run
/// to run. On return only root's `buf` holds the result; other ranks hold
/// partial sums.
pub(crate) async fn tree_reduce<T: Element>(
    client: &Communicator,
    buf: &mut [u8],
    op: ReduceOp,
    root: Rank,
    tag: u64,
) -> Result<()> {
    let world = client.world_size() as usize;
    let rank = client.rank() as usize;
    let root = root as usize;

    if world <= 1 {
        return Ok(());
    }

    let total_bytes = buf.len();
    let vrank = (rank + world - root) % world;
    let to_real = |v: usize| ((v + root) % world) as Rank;

    let p2 = if world.is_power_of_two() {
        world
    } else {
        world.next_power_of_two() >> 1
    };
    let excess = world - p2;

    if vrank >= p2 {
        // Excess rank: hand the data to its partner and sit out.
        return collective_send(client, to_real(vrank - p2), buf, "reduce", tag).await;
    }

    if vrank < excess {
        let received = collective_recv(client, to_real(vrank + p2), "reduce", tag).await?;
        expect_len(&received, total_bytes)?;
        reduce_slice::<T>(buf, &received, op)?;
    }

    let log2 = p2.trailing_zeros() as usize;
    for round in 0..log2 {
        let mask = 1 << round;
        let partner = vrank ^ mask;
        if vrank & mask != 0 {
            collective_send(client, to_real(partner), buf, "reduce", tag).await?;
            break;
        }
        let received = collective_recv(client, to_real(partner), "reduce", tag).await?;
        expect_len(&received, total_bytes)?;
        reduce_slice::<T>(buf, &received, op)?;
    }

    Ok(())
}
