use crate::error::{ParkmeansError, Result};
use std::path::Path;
use tokio::io::AsyncReadExt;

use super::centroids::Centroids;

/// Input file read when none is given.
pub const DEFAULT_INPUT: &str = "numbers";

/// Raw observations as held by the root worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dataset {
    bytes: Vec<u8>,
}

impl Dataset {
    /// Read at most `max_len` bytes from a flat binary file.
    pub async fn load(path: impl AsRef<Path>, max_len: usize) -> Result<Self> {
        let path = path.as_ref();
        let wrap = |source| ParkmeansError::Dataset {
            path: path.display().to_string(),
            source,
        };

        let file = tokio::fs::File::open(path).await.map_err(wrap)?;
        let mut bytes = Vec::new();
        file.take(max_len as u64)
            .read_to_end(&mut bytes)
            .await
            .map_err(wrap)?;

        tracing::debug!(path = %path.display(), len = bytes.len(), "dataset loaded");
        Ok(Self { bytes })
    }

    /// Read what a run with `workers` workers and `clusters` clusters uses:
    /// one observation per worker, and at least one seed per cluster.
    pub async fn load_for_run(
        path: impl AsRef<Path>,
        workers: usize,
        clusters: usize,
    ) -> Result<Self> {
        Self::load(path, workers.max(clusters)).await
    }

    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Fail unless there is at least one observation per worker.
    pub fn require_workers(&self, workers: usize) -> Result<()> {
        if self.bytes.len() < workers {
            return Err(ParkmeansError::DatasetTooSmall {
                available: self.bytes.len(),
                required: workers,
            });
        }
        Ok(())
    }

    /// The first `clusters` observations as initial centroids.
    pub fn seeds(&self, clusters: usize) -> Result<Centroids> {
        let seeds = self
            .bytes
            .get(..clusters)
            .ok_or(ParkmeansError::TooFewSeeds {
                available: self.bytes.len(),
                clusters,
            })?;
        Ok(Centroids::from_seeds(seeds))
    }
}
