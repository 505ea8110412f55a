//! Hands each worker its observation and the seed centroids.

use crate::client::Communicator;
use crate::error::{ParkmeansError, Result};
use crate::types::ROOT_RANK;

use super::centroids::Centroids;
use super::dataset::Dataset;

/// What one worker holds once distribution is complete.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalShard {
    pub observation: u8,
    pub seeds: Centroids,
}

/// Scatter one observation to every rank and broadcast the seed centroids.
///
/// Only the root reads `dataset`. The root checks its preconditions before
/// any data moves; if they fail it returns the error without sending, and
/// the caller's abort releases the ranks waiting on the scatter. A closing
/// barrier keeps any rank from starting the loop before all of them hold
/// their shard.
pub async fn distribute(
    client: &Communicator,
    dataset: Option<&Dataset>,
    clusters: usize,
) -> Result<LocalShard> {
    let world = client.world_size() as usize;

    let (observations, mut seeds) = if client.is_root() {
        let dataset = dataset.ok_or_else(|| {
            ParkmeansError::InvalidConfig(format!("rank {ROOT_RANK} was started without a dataset"))
        })?;
        dataset.require_workers(world)?;
        let seeds = dataset.seeds(clusters)?;
        (&dataset.as_bytes()[..world], seeds)
    } else {
        (&[][..], Centroids::zeroed(clusters))
    };

    let mut observation = [0u8];
    client
        .scatter(observations, &mut observation, ROOT_RANK)
        .await?;
    client.broadcast(seeds.as_mut_slice(), ROOT_RANK).await?;
    client.barrier().await?;

    tracing::debug!(
        rank = client.rank(),
        observation = observation[0],
        seeds = %seeds,
        "shard received"
    );

    Ok(LocalShard {
        observation: observation[0],
        seeds,
    })
}
