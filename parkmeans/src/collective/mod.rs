//! Collective algorithms over the worker mesh.
//!
//! These operate on little-endian byte buffers; the typed entry points live
//! on [`Communicator`](crate::client::Communicator).

mod allreduce;
mod barrier;
mod broadcast;
mod helpers;
mod reduce;
mod scatter;

pub(crate) use allreduce::all_reduce;
pub(crate) use barrier::barrier;
pub(crate) use broadcast::tree_broadcast;
pub(crate) use reduce::tree_reduce;
pub(crate) use scatter::scatter;
