//! Runtime-configurable parameters for the transport and the clustering loop.
//!
//! All values have sensible defaults. Override via environment variables
//! (prefixed `PARKMEANS_`) or by constructing the structs directly.

use crate::error::{ParkmeansError, Result};
use std::str::FromStr;
use std::time::Duration;

/// Convergence tolerance of the finer of the two reference variants.
pub const EPSILON_FINE: f32 = 0.01;

/// Convergence tolerance of the coarser reference variant.
pub const EPSILON_COARSE: f32 = 0.1;

/// Number of clusters the reference program partitions into.
pub const DEFAULT_CLUSTERS: usize = 4;

/// Tuning parameters for cluster formation and collective operations.
#[derive(Debug, Clone)]
pub struct ParkmeansConfig {
    /// Timeout for individual send/recv operations within collectives.
    pub collective_timeout: Duration,

    /// How long the seed waits for every worker to join.
    pub formation_timeout: Duration,
}

impl Default for ParkmeansConfig {
    fn default() -> Self {
        Self {
            collective_timeout: Duration::from_secs(30),
            formation_timeout: Duration::from_secs(60),
        }
    }
}

impl ParkmeansConfig {
    /// Load config from environment variables, falling back to defaults.
    ///
    /// Recognized variables:
    /// - `PARKMEANS_COLLECTIVE_TIMEOUT_SECS`
    /// - `PARKMEANS_FORMATION_TIMEOUT_SECS`
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Some(s) = env_parse::<u64>("PARKMEANS_COLLECTIVE_TIMEOUT_SECS") {
            cfg.collective_timeout = Duration::from_secs(s);
        }
        if let Some(s) = env_parse::<u64>("PARKMEANS_FORMATION_TIMEOUT_SECS") {
            cfg.formation_timeout = Duration::from_secs(s);
        }

        cfg
    }
}

/// How a round's partial aggregate is laid out for reduction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AggregateLayout {
    /// One `f32` reduction over `[sums | counts]`.
    #[default]
    Interleaved,
    /// An `f32` reduction of the sums followed by a `u32` reduction of the counts.
    SeparateCounts,
}

impl AggregateLayout {
    pub const fn name(self) -> &'static str {
        match self {
            AggregateLayout::Interleaved => "interleaved",
            AggregateLayout::SeparateCounts => "separate-counts",
        }
    }
}

impl std::fmt::Display for AggregateLayout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AggregateLayout {
    type Err = ParkmeansError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "interleaved" => Ok(AggregateLayout::Interleaved),
            "separate-counts" | "separate" => Ok(AggregateLayout::SeparateCounts),
            other => Err(ParkmeansError::InvalidConfig(format!(
                "unknown aggregate layout {other:?}"
            ))),
        }
    }
}

/// Parameters of the clustering loop.
///
/// Every worker must run with identical values, otherwise ranks disagree on
/// when to stop and the next collective fails out of step.
#[derive(Debug, Clone, PartialEq)]
pub struct KMeansConfig {
    /// Number of clusters (K).
    pub clusters: usize,
    /// Maximum per-centroid movement for a round to count as converged.
    pub epsilon: f32,
    /// Optional safety bound on the number of rounds.
    pub max_rounds: Option<u64>,
    pub layout: AggregateLayout,
}

impl Default for KMeansConfig {
    fn default() -> Self {
        Self {
            clusters: DEFAULT_CLUSTERS,
            epsilon: EPSILON_FINE,
            max_rounds: None,
            layout: AggregateLayout::Interleaved,
        }
    }
}

impl KMeansConfig {
    /// Load config from environment variables, falling back to defaults.
    ///
    /// Recognized variables:
    /// - `PARKMEANS_CLUSTERS`
    /// - `PARKMEANS_EPSILON`
    /// - `PARKMEANS_MAX_ROUNDS`
    /// - `PARKMEANS_LAYOUT` (`interleaved` or `separate-counts`)
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Some(k) = env_parse::<usize>("PARKMEANS_CLUSTERS") {
            cfg.clusters = k;
        }
        if let Some(eps) = env_parse::<f32>("PARKMEANS_EPSILON") {
            cfg.epsilon = eps;
        }
        if let Some(n) = env_parse::<u64>("PARKMEANS_MAX_ROUNDS") {
            cfg.max_rounds = Some(n);
        }
        if let Ok(v) = std::env::var("PARKMEANS_LAYOUT") {
            match v.parse() {
                Ok(layout) => cfg.layout = layout,
                Err(e) => tracing::warn!("ignoring PARKMEANS_LAYOUT: {e}"),
            }
        }

        cfg
    }

    pub fn with_clusters(mut self, clusters: usize) -> Self {
        self.clusters = clusters;
        self
    }

    pub fn with_epsilon(mut self, epsilon: f32) -> Self {
        self.epsilon = epsilon;
        self
    }

    pub fn with_max_rounds(mut self, max_rounds: Option<u64>) -> Self {
        self.max_rounds = max_rounds;
        self
    }

    pub fn with_layout(mut self, layout: AggregateLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Reject parameter combinations the engine cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.clusters == 0 {
            return Err(ParkmeansError::InvalidConfig(
                "clusters must be at least 1".into(),
            ));
        }
        if !self.epsilon.is_finite() || self.epsilon < 0.0 {
            return Err(ParkmeansError::InvalidConfig(format!(
                "epsilon must be a finite non-negative number, got {}",
                self.epsilon
            )));
        }
        if self.max_rounds == Some(0) {
            return Err(ParkmeansError::InvalidConfig(
                "max_rounds must be at least 1 when set".into(),
            ));
        }
        Ok(())
    }
}

fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse::<T>().ok())
}
