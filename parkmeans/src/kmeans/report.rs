use std::fmt;

use super::centroids::Centroids;
use super::classify::nearest_centroid;

/// One line of the final report.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterSummary {
    pub centroid: f32,
    /// Members in dataset order.
    pub members: Vec<u8>,
}

/// Final centroids with their members, as printed by the root.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterReport {
    clusters: Vec<ClusterSummary>,
}

impl ClusterReport {
    /// Group every observation under its nearest final centroid.
    pub fn build(centroids: &Centroids, observations: &[u8]) -> Self {
        let mut clusters: Vec<ClusterSummary> = centroids
            .as_slice()
            .iter()
            .map(|&centroid| ClusterSummary {
                centroid,
                members: Vec::new(),
            })
            .collect();

        for &obs in observations {
            let i = nearest_centroid(obs, centroids.as_slice());
            if let Some(cluster) = clusters.get_mut(i) {
                cluster.members.push(obs);
            }
        }

        Self { clusters }
    }

    pub fn clusters(&self) -> &[ClusterSummary] {
        &self.clusters
    }
}

/// `[<centroid>] m1, m2, ...` per cluster, one line each.
impl fmt::Display for ClusterReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for cluster in &self.clusters {
            write!(f, "[{:.1}]", cluster.centroid)?;
            for (i, m) in cluster.members.iter().enumerate() {
                if i > 0 {
                    f.write_str(",")?;
                }
                write!(f, " {m}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
