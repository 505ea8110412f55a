use crate::client::Communicator;
use crate::collective::helpers::{collective_recv, collective_send, expect_len};
use crate::error::{ParkmeansError, Result};
use crate::types::Rank;
use futures::future::try_join_all;

/// Scatter: root distributes one `chunk_bytes` chunk to each rank.
///
/// Root sends the `i`-th chunk of `send` to rank `i` and keeps its own;
/// non-root ranks receive their chunk from root. `send` is only read on root,
/// where it must hold exactly `chunk_bytes * world_size` bytes.
pub(crate) async fn scatter(
    client: &Communicator,
    send: &[u8],
    chunk_bytes: usize,
    root: Rank,
    tag: u64,
) -> Result<Vec<u8>> {
    let world = client.world_size();
    let rank = client.rank();

    if rank != root {
        let received = collective_recv(client, root, "scatter", tag).await?;
        expect_len(&received, chunk_bytes)?;
        return Ok(received);
    }

    let total_bytes = chunk_bytes * world as usize;
    if send.len() != total_bytes {
        return Err(ParkmeansError::BufferSizeMismatch {
            expected: total_bytes,
            actual: send.len(),
        });
    }

    let futs: Vec<_> = (0..world)
        .filter(|&r| r != root)
        .map(|r| {
            let start = r as usize * chunk_bytes;
            let chunk = &send[start..start + chunk_bytes];
            collective_send(client, r, chunk, "scatter", tag)
        })
        .collect();
    try_join_all(futs).await?;

    let own_start = root as usize * chunk_bytes;
    Ok(send[own_start..own_start + chunk_bytes].to_vec())
}
