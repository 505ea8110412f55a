//! Distributed k-means over single-byte observations.
//!
//! Every worker owns exactly one observation. Workers agree on centroids
//! only through collective sums, so no observation ever leaves its worker
//! after distribution.

pub mod aggregate;
pub mod centroids;
pub mod classify;
pub mod dataset;
pub mod distribution;
pub mod engine;
pub mod report;

pub use aggregate::{GlobalAggregate, PartialAggregate};
pub use centroids::{CentroidGenerations, Centroids};
pub use classify::nearest_centroid;
pub use dataset::{DEFAULT_INPUT, Dataset};
pub use distribution::{LocalShard, distribute};
pub use engine::{Convergence, ConvergenceEngine, EngineState, update_centroids};
pub use report::{ClusterReport, ClusterSummary};

use crate::client::Communicator;
use crate::config::{KMeansConfig, ParkmeansConfig};
use crate::error::{ParkmeansError, Result};
use crate::types::{Rank, ReduceOp};
use futures::future::BoxFuture;

/// All-participant element-wise sum.
///
/// On return every participant's buffer holds the same sum, bit for bit.
pub trait SumReduce: Send + Sync {
    fn sum_f32<'a>(&'a self, buf: &'a mut [f32]) -> BoxFuture<'a, Result<()>>;
    fn sum_u32<'a>(&'a self, buf: &'a mut [u32]) -> BoxFuture<'a, Result<()>>;
}

impl SumReduce for Communicator {
    fn sum_f32<'a>(&'a self, buf: &'a mut [f32]) -> BoxFuture<'a, Result<()>> {
        Box::pin(self.all_reduce(buf, ReduceOp::Sum))
    }

    fn sum_u32<'a>(&'a self, buf: &'a mut [u32]) -> BoxFuture<'a, Result<()>> {
        Box::pin(self.all_reduce(buf, ReduceOp::Sum))
    }
}

/// What one worker ends up with.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkerOutcome {
    pub rank: Rank,
    pub convergence: Convergence,
    /// Present on the root only.
    pub report: Option<ClusterReport>,
}

/// Run the whole computation on one worker: distribution, the refinement
/// loop, and (on the root) the report.
///
/// A local failure is broadcast to every peer with
/// [`Communicator::abort`] before it is returned. Failures that are
/// themselves a peer's abort are returned without echoing them back.
pub async fn run_worker(
    client: &Communicator,
    dataset: Option<&Dataset>,
    config: &KMeansConfig,
) -> Result<WorkerOutcome> {
    match run(client, dataset, config).await {
        Ok(outcome) => Ok(outcome),
        Err(e) => {
            if e.is_remote_abort() {
                tracing::warn!(rank = client.rank(), "stopping: {e}");
            } else {
                client.abort(&e.to_string()).await;
            }
            Err(e)
        }
    }
}

async fn run(
    client: &Communicator,
    dataset: Option<&Dataset>,
    config: &KMeansConfig,
) -> Result<WorkerOutcome> {
    config.validate()?;

    let shard = distribute(client, dataset, config.clusters).await?;
    let convergence =
        ConvergenceEngine::new(client, shard.observation, shard.seeds, config.clone())?
            .run()
            .await?;

    let report = match dataset {
        Some(dataset) if client.is_root() => {
            let world = client.world_size() as usize;
            let observations = &dataset.as_bytes()[..world.min(dataset.len())];
            Some(ClusterReport::build(&convergence.centroids, observations))
        }
        _ => None,
    };

    Ok(WorkerOutcome {
        rank: client.rank(),
        convergence,
        report,
    })
}

/// Run `workers` workers as tasks in this process, meshed over loopback TCP.
///
/// Rank 0 receives `dataset`. Outcomes are returned in rank order. When
/// several workers fail, the error that caused the abort is returned in
/// preference to the peers' `Aborted` errors.
pub async fn run_local(
    dataset: Dataset,
    workers: u32,
    runtime: ParkmeansConfig,
    config: KMeansConfig,
) -> Result<Vec<WorkerOutcome>> {
    let comms = Communicator::bootstrap_local(workers, runtime).await?;
    let mut dataset = Some(dataset);

    let handles: Vec<_> = comms
        .into_iter()
        .map(|comm| {
            let dataset = if comm.is_root() { dataset.take() } else { None };
            let config = config.clone();
            tokio::spawn(async move { run_worker(&comm, dataset.as_ref(), &config).await })
        })
        .collect();

    let mut outcomes = Vec::with_capacity(handles.len());
    let mut first_error: Option<ParkmeansError> = None;
    for h in handles {
        let result = h
            .await
            .map_err(|e| ParkmeansError::transport_with_source("worker task panicked", e))?;
        match result {
            Ok(outcome) => outcomes.push(outcome),
            Err(e) => {
                let replace = match &first_error {
                    None => true,
                    Some(prev) => prev.is_remote_abort() && !e.is_remote_abort(),
                };
                if replace {
                    first_error = Some(e);
                }
            }
        }
    }

    if let Some(e) = first_error {
        return Err(e);
    }
    outcomes.sort_by_key(|o| o.rank);
    Ok(outcomes)
}
