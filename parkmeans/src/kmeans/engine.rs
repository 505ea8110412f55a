//! The per-worker refinement loop.
//!
//! Each round the worker classifies its observation against the current
//! centroids, sums its one-hot contribution with everyone else's, and
//! derives the next centroids from the global sums. All inputs to the
//! convergence decision are either local constants or collectively reduced
//! values, so every worker stops in the same round with the same centroids.

use crate::config::KMeansConfig;
use crate::error::{ParkmeansError, Result};

use super::SumReduce;
use super::aggregate::{GlobalAggregate, PartialAggregate};
use super::centroids::{CentroidGenerations, Centroids};
use super::classify::nearest_centroid;

/// Where the engine is within a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    RoundStart,
    /// Observation assigned; the contribution has not been reduced yet.
    Classify,
    /// The global aggregate for the round is available.
    Reduce,
    /// The proposed centroids are built and the predicate evaluated.
    Update,
    /// Terminal: every centroid moved by at most epsilon.
    Converged,
    /// Terminal: the round cap was hit before convergence.
    RoundLimit,
}

impl EngineState {
    pub fn is_terminal(self) -> bool {
        matches!(self, EngineState::Converged | EngineState::RoundLimit)
    }
}

/// Outcome of a finished run.
#[derive(Debug, Clone, PartialEq)]
pub struct Convergence {
    /// Final centroids, identical on every worker.
    pub centroids: Centroids,
    /// Number of rounds executed (at least 1).
    pub rounds: u64,
    /// False when the run stopped at the round cap.
    pub converged: bool,
    /// Cluster this worker's observation was assigned to in the last round.
    pub assignment: usize,
}

/// Derive the next centroids from a round's global aggregate.
///
/// `proposed[i]` is the mean of cluster `i`, or `previous[i]` when the
/// cluster is empty. Returns whether every centroid moved by at most
/// `epsilon`.
pub fn update_centroids(
    previous: &[f32],
    global: &GlobalAggregate,
    proposed: &mut [f32],
    epsilon: f32,
) -> bool {
    let mut settled = true;
    for (i, slot) in proposed.iter_mut().enumerate() {
        let old = previous[i];
        let count = global.counts()[i];
        *slot = if count == 0 {
            old
        } else {
            global.sums()[i] / count as f32
        };
        if (*slot - old).abs() > epsilon {
            settled = false;
        }
    }
    settled
}

/// Drives one worker through the refinement loop.
pub struct ConvergenceEngine<'a, R: SumReduce + ?Sized> {
    reducer: &'a R,
    observation: u8,
    config: KMeansConfig,
    generations: CentroidGenerations,
    state: EngineState,
    round: u64,
    assignment: usize,
    global: Option<GlobalAggregate>,
    settled: bool,
}

impl<'a, R: SumReduce + ?Sized> ConvergenceEngine<'a, R> {
    pub fn new(
        reducer: &'a R,
        observation: u8,
        seeds: Centroids,
        config: KMeansConfig,
    ) -> Result<Self> {
        config.validate()?;
        if seeds.len() != config.clusters {
            return Err(ParkmeansError::InvalidConfig(format!(
                "{} seed centroids for {} clusters",
                seeds.len(),
                config.clusters
            )));
        }

        Ok(Self {
            reducer,
            observation,
            config,
            generations: CentroidGenerations::new(seeds),
            state: EngineState::RoundStart,
            round: 0,
            assignment: 0,
            global: None,
            settled: false,
        })
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    /// Rounds started so far.
    pub fn round(&self) -> u64 {
        self.round
    }

    /// Centroids the next classification runs against.
    pub fn centroids(&self) -> &Centroids {
        self.generations.current()
    }

    /// Perform one state transition and return the new state.
    ///
    /// Only the `Classify → Reduce` transition communicates with other
    /// workers. Stepping a terminal engine is a no-op.
    pub async fn step(&mut self) -> Result<EngineState> {
        let next = match self.state {
            EngineState::RoundStart => {
                self.round += 1;
                self.assignment =
                    nearest_centroid(self.observation, self.generations.current().as_slice());
                EngineState::Classify
            }
            EngineState::Classify => {
                let partial =
                    PartialAggregate::new(self.config.clusters, self.assignment, self.observation);
                let global = partial.reduce(self.reducer, self.config.layout).await?;
                if global.sums().len() != self.config.clusters {
                    return Err(ParkmeansError::BufferSizeMismatch {
                        expected: self.config.clusters,
                        actual: global.sums().len(),
                    });
                }
                self.global = Some(global);
                EngineState::Reduce
            }
            EngineState::Reduce => {
                let global = self.global.take().ok_or_else(|| {
                    ParkmeansError::InvalidConfig("reduce state without an aggregate".into())
                })?;
                let (current, proposed) = self.generations.split();
                self.settled = update_centroids(
                    current.as_slice(),
                    &global,
                    proposed.as_mut_slice(),
                    self.config.epsilon,
                );
                tracing::debug!(
                    round = self.round,
                    counts = ?global.counts(),
                    centroids = %proposed,
                    settled = self.settled,
                    "round reduced"
                );
                EngineState::Update
            }
            EngineState::Update => {
                if self.settled {
                    EngineState::Converged
                } else if self.config.max_rounds.is_some_and(|cap| self.round >= cap) {
                    EngineState::RoundLimit
                } else {
                    self.generations.swap();
                    EngineState::RoundStart
                }
            }
            terminal => terminal,
        };

        tracing::trace!(round = self.round, from = ?self.state, to = ?next, "engine transition");
        self.state = next;
        Ok(next)
    }

    /// Step until a terminal state.
    pub async fn run(mut self) -> Result<Convergence> {
        while !self.state.is_terminal() {
            self.step().await?;
        }

        let converged = self.state == EngineState::Converged;
        if converged {
            tracing::info!(rounds = self.round, "centroids converged");
        } else {
            tracing::warn!(
                rounds = self.round,
                max_shift = self.generations.proposed().max_shift(self.generations.current()),
                "round limit reached before convergence"
            );
        }

        Ok(Convergence {
            centroids: self.generations.proposed().clone(),
            rounds: self.round,
            converged,
            assignment: self.assignment,
        })
    }
}
