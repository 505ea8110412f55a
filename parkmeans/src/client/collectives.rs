use crate::collective;
use crate::error::Result;
use crate::reduce::{Element, copy_from_bytes, to_bytes};
use crate::types::{Rank, ReduceOp};

use super::Communicator;

impl Communicator {
    /// Scatter from `root`: rank `i` receives the `i`-th `recv.len()` chunk of `send`.
    ///
    /// `send` is only read on root, where it must hold `recv.len() * world_size`
    /// elements. Non-root ranks may pass an empty slice.
    pub async fn scatter<T: Element>(&self, send: &[T], recv: &mut [T], root: Rank) -> Result<()> {
        self.check_rank(root)?;
        let tag = self.next_tag();
        let chunk_bytes = recv.len() * T::DTYPE.size_in_bytes();

        let send_bytes = if self.rank == root {
            to_bytes(send)
        } else {
            Vec::new()
        };
        let own = collective::scatter(self, &send_bytes, chunk_bytes, root, tag).await?;
        copy_from_bytes(recv, &own)
    }

    /// Broadcast `buf` from `root` to all ranks.
    pub async fn broadcast<T: Element>(&self, buf: &mut [T], root: Rank) -> Result<()> {
        self.check_rank(root)?;
        let tag = self.next_tag();

        let mut bytes = to_bytes(buf);
        collective::tree_broadcast(self, &mut bytes, root, tag).await?;
        copy_from_bytes(buf, &bytes)
    }

    /// Reduce `buf` element-wise into `root`.
    ///
    /// Only root's `buf` holds the result afterwards; other ranks' buffers
    /// are left as they were.
    pub async fn reduce<T: Element>(&self, buf: &mut [T], op: ReduceOp, root: Rank) -> Result<()> {
        self.check_rank(root)?;
        let tag = self.next_tag();

        let mut bytes = to_bytes(buf);
        collective::tree_reduce::<T>(self, &mut bytes, op, root, tag).await?;
        if self.rank == root {
            copy_from_bytes(buf, &bytes)?;
        }
        Ok(())
    }

    /// AllReduce in place: every rank ends with the same reduced `buf`.
    pub async fn all_reduce<T: Element>(&self, buf: &mut [T], op: ReduceOp) -> Result<()> {
        let reduce_tag = self.next_tag();
        let broadcast_tag = self.next_tag();

        let mut bytes = to_bytes(buf);
        collective::all_reduce::<T>(self, &mut bytes, op, reduce_tag, broadcast_tag).await?;
        copy_from_bytes(buf, &bytes)
    }

    /// Block until every rank has reached the barrier.
    pub async fn barrier(&self) -> Result<()> {
        let tag = self.next_tag();
        collective::barrier(self, tag).await
    }
}
