//! Per-round sum/count aggregates and their reduction layouts.

use crate::config::AggregateLayout;
use crate::error::{ParkmeansError, Result};

use super::SumReduce;

/// One worker's contribution to a round: zero everywhere except at the
/// cluster its observation was assigned to, which holds `(observation, 1)`.
#[derive(Debug, Clone, PartialEq)]
pub struct PartialAggregate {
    sums: Vec<f32>,
    counts: Vec<u32>,
}

impl PartialAggregate {
    pub fn new(clusters: usize, assignment: usize, observation: u8) -> Self {
        let mut sums = vec![0.0; clusters];
        let mut counts = vec![0; clusters];
        if let (Some(s), Some(c)) = (sums.get_mut(assignment), counts.get_mut(assignment)) {
            *s = f32::from(observation);
            *c = 1;
        }
        Self { sums, counts }
    }

    pub fn clusters(&self) -> usize {
        self.sums.len()
    }

    pub fn sums(&self) -> &[f32] {
        &self.sums
    }

    pub fn counts(&self) -> &[u32] {
        &self.counts
    }

    /// `[sums | counts]` as one `f32` vector of length 2K.
    fn interleaved(&self) -> Vec<f32> {
        let mut buf = Vec::with_capacity(2 * self.clusters());
        buf.extend_from_slice(&self.sums);
        buf.extend(self.counts.iter().map(|&c| c as f32));
        buf
    }

    /// Sum this contribution with every other worker's.
    ///
    /// The layout decides how many reductions run and in which element
    /// type the counts travel; every worker must use the same layout.
    pub async fn reduce<R>(&self, reducer: &R, layout: AggregateLayout) -> Result<GlobalAggregate>
    where
        R: SumReduce + ?Sized,
    {
        match layout {
            AggregateLayout::Interleaved => {
                let mut buf = self.interleaved();
                reducer.sum_f32(&mut buf).await?;
                GlobalAggregate::from_interleaved(&buf)
            }
            AggregateLayout::SeparateCounts => {
                let mut sums = self.sums.clone();
                let mut counts = self.counts.clone();
                reducer.sum_f32(&mut sums).await?;
                reducer.sum_u32(&mut counts).await?;
                Ok(GlobalAggregate { sums, counts })
            }
        }
    }
}

/// The collective sum of every worker's [`PartialAggregate`] for one round.
#[derive(Debug, Clone, PartialEq)]
pub struct GlobalAggregate {
    sums: Vec<f32>,
    counts: Vec<u32>,
}

impl GlobalAggregate {
    pub fn new(sums: Vec<f32>, counts: Vec<u32>) -> Result<Self> {
        if sums.len() != counts.len() {
            return Err(ParkmeansError::BufferSizeMismatch {
                expected: sums.len(),
                actual: counts.len(),
            });
        }
        Ok(Self { sums, counts })
    }

    /// Split a reduced `[sums | counts]` vector.
    pub fn from_interleaved(buf: &[f32]) -> Result<Self> {
        if buf.len() % 2 != 0 {
            return Err(ParkmeansError::DecodeFailed(format!(
                "interleaved aggregate has odd length {}",
                buf.len()
            )));
        }
        let (sums, counts) = buf.split_at(buf.len() / 2);
        Ok(Self {
            sums: sums.to_vec(),
            counts: counts.iter().map(|&c| c as u32).collect(),
        })
    }

    pub fn sums(&self) -> &[f32] {
        &self.sums
    }

    pub fn counts(&self) -> &[u32] {
        &self.counts
    }
}
