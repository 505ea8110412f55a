use crate::client::Communicator;
use crate::collective::broadcast::tree_broadcast;
use crate::collective::reduce::tree_reduce;
use crate::error::Result;
use crate::reduce::Element;
use crate::types::{ROOT_RANK, ReduceOp};

/// AllReduce: every rank ends with the element-wise reduction of all inputs.
///
/// Reduces to rank 0 along a fixed binomial tree, then broadcasts rank 0's
/// result. Every rank receives the same bytes, so floating-point results
/// are bit-identical across ranks regardless of world size.
pub(crate) async fn all_reduce<T: Element>(
    client: &Communicator,
    buf: &mut [u8],
    op: ReduceOp,
    reduce_tag: u64,
    broadcast_tag: u64,
) -> Result<()> {
    if client.world_size() <= 1 {
        return Ok(());
    }

    tree_reduce::<T>(client, buf, op, ROOT_RANK, reduce_tag).await?;
    tree_broadcast(client, buf, ROOT_RANK, broadcast_tag).await
}
