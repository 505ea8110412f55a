//! Centroid vectors and the two-generation buffer the engine rotates through.

use std::fmt;

/// K cluster centres on the observation axis.
#[derive(Debug, Clone, PartialEq)]
pub struct Centroids(Vec<f32>);

impl Centroids {
    pub fn new(values: Vec<f32>) -> Self {
        Self(values)
    }

    /// Seed centroids from raw observations, one per cluster.
    pub fn from_seeds(seeds: &[u8]) -> Self {
        Self(seeds.iter().map(|&b| f32::from(b)).collect())
    }

    pub fn zeroed(clusters: usize) -> Self {
        Self(vec![0.0; clusters])
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    pub fn as_mut_slice(&mut self) -> &mut [f32] {
        &mut self.0
    }

    /// Largest absolute per-cluster movement between two generations.
    pub fn max_shift(&self, other: &Centroids) -> f32 {
        self.0
            .iter()
            .zip(&other.0)
            .map(|(a, b)| (a - b).abs())
            .fold(0.0, f32::max)
    }
}

impl From<Vec<f32>> for Centroids {
    fn from(values: Vec<f32>) -> Self {
        Self(values)
    }
}

impl fmt::Display for Centroids {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, c) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{c:.2}")?;
        }
        f.write_str("]")
    }
}

/// Double buffer of centroid generations.
///
/// The active slot holds the centroids classification runs against; the
/// other slot receives the proposal built from the round's reduction.
/// [`swap`](Self::swap) flips the active index without reallocating.
#[derive(Debug, Clone)]
pub struct CentroidGenerations {
    slots: [Centroids; 2],
    active: usize,
}

impl CentroidGenerations {
    pub fn new(initial: Centroids) -> Self {
        Self {
            slots: [initial.clone(), initial],
            active: 0,
        }
    }

    pub fn current(&self) -> &Centroids {
        &self.slots[self.active]
    }

    pub fn proposed(&self) -> &Centroids {
        &self.slots[self.active ^ 1]
    }

    /// Borrow the current generation for reading and the proposed one for writing.
    pub fn split(&mut self) -> (&Centroids, &mut Centroids) {
        let [first, second] = &mut self.slots;
        if self.active == 0 {
            (&*first, second)
        } else {
            (&*second, first)
        }
    }

    /// Make the proposed generation current.
    pub fn swap(&mut self) {
        self.active ^= 1;
    }
}
