use futures::future::{BoxFuture, join_all};
use parkmeans::kmeans::{Centroids, ConvergenceEngine, nearest_centroid};
use parkmeans::{
    AggregateLayout, ClusterReport, Convergence, Dataset, KMeansConfig, ParkmeansConfig,
    ParkmeansError, Result, SumReduce, run_local,
};
use proptest::prelude::*;
use std::io::Write;
use std::ops::AddAssign;
use std::sync::Mutex;
use std::time::Duration;

fn runtime() -> ParkmeansConfig {
    ParkmeansConfig {
        collective_timeout: Duration::from_secs(5),
        formation_timeout: Duration::from_secs(10),
    }
}

fn bits(centroids: &Centroids) -> Vec<u32> {
    centroids.as_slice().iter().map(|c| c.to_bits()).collect()
}

async fn report_for(bytes: &[u8], workers: u32, config: KMeansConfig) -> String {
    let outcomes = run_local(Dataset::from_bytes(bytes), workers, runtime(), config)
        .await
        .unwrap();
    outcomes[0].report.as_ref().unwrap().to_string()
}

#[tokio::test]
async fn test_four_separated_points_converge_in_one_round() {
    let outcomes = run_local(
        Dataset::from_bytes([10u8, 20, 200, 210]),
        4,
        runtime(),
        KMeansConfig::default(),
    )
    .await
    .unwrap();

    assert_eq!(outcomes.len(), 4);
    for (rank, outcome) in outcomes.iter().enumerate() {
        assert_eq!(outcome.rank as usize, rank);
        assert!(outcome.convergence.converged);
        assert_eq!(outcome.convergence.rounds, 1);
        assert_eq!(
            outcome.convergence.centroids.as_slice(),
            &[10.0, 20.0, 200.0, 210.0]
        );
        assert_eq!(outcome.convergence.assignment, rank);
        assert_eq!(outcome.report.is_some(), rank == 0);
    }

    let report = outcomes[0].report.as_ref().unwrap().to_string();
    assert_eq!(report, "[10.0] 10\n[20.0] 20\n[200.0] 200\n[210.0] 210\n");
}

#[tokio::test]
async fn test_too_few_observations_aborts_every_worker() {
    let err = run_local(
        Dataset::from_bytes(vec![1u8; 8]),
        9,
        runtime(),
        KMeansConfig::default(),
    )
    .await
    .unwrap_err();
    assert!(
        matches!(
            err,
            ParkmeansError::DatasetTooSmall {
                available: 8,
                required: 9
            }
        ),
        "got {err:?}"
    );
}

#[tokio::test]
async fn test_fewer_observations_than_clusters_aborts() {
    let err = run_local(
        Dataset::from_bytes([5u8, 6]),
        2,
        runtime(),
        KMeansConfig::default(),
    )
    .await
    .unwrap_err();
    assert!(
        matches!(err, ParkmeansError::TooFewSeeds { clusters: 4, .. }),
        "got {err:?}"
    );
}

#[tokio::test]
async fn test_dataset_is_truncated_to_world_size() {
    let report = report_for(&[10, 20, 200, 210, 99, 99], 4, KMeansConfig::default()).await;
    assert!(!report.contains("99"), "{report}");
}

#[tokio::test]
async fn test_runs_are_deterministic() {
    let data: Vec<u8> = (0..16u32).map(|i| ((i * 37 + 11) % 256) as u8).collect();
    let first = report_for(&data, 16, KMeansConfig::default()).await;
    for _ in 0..2 {
        assert_eq!(report_for(&data, 16, KMeansConfig::default()).await, first);
    }
}

#[tokio::test]
async fn test_all_workers_agree_and_membership_is_conserved() {
    let data: Vec<u8> = vec![3, 250, 17, 128, 90, 4, 201, 66, 66, 180, 12];
    let outcomes = run_local(
        Dataset::from_bytes(data.clone()),
        data.len() as u32,
        runtime(),
        KMeansConfig::default(),
    )
    .await
    .unwrap();

    let centroids = &outcomes[0].convergence.centroids;
    for o in &outcomes {
        assert_eq!(
            bits(&o.convergence.centroids),
            bits(centroids),
            "rank {} disagrees",
            o.rank
        );
        assert_eq!(o.convergence.rounds, outcomes[0].convergence.rounds);
        // Each worker's last local decision matches the root's re-classification.
        assert_eq!(
            o.convergence.assignment,
            nearest_centroid(data[o.rank as usize], centroids.as_slice())
        );
    }

    let report = outcomes[0].report.as_ref().unwrap();
    let mut members: Vec<u8> = report
        .clusters()
        .iter()
        .flat_map(|c| c.members.iter().copied())
        .collect();
    let mut expected = data.clone();
    members.sort_unstable();
    expected.sort_unstable();
    assert_eq!(members, expected);
}

#[tokio::test]
async fn test_layouts_produce_same_result() {
    let data: Vec<u8> = vec![1, 2, 3, 100, 101, 102, 250, 251, 7, 8];
    let interleaved = report_for(
        &data,
        10,
        KMeansConfig::default().with_layout(AggregateLayout::Interleaved),
    )
    .await;
    let separate = report_for(
        &data,
        10,
        KMeansConfig::default().with_layout(AggregateLayout::SeparateCounts),
    )
    .await;
    assert_eq!(interleaved, separate);
}

#[tokio::test]
async fn test_empty_cluster_keeps_seed() {
    // Duplicate seeds: the second copy never wins a tie, stays empty, and
    // keeps its seed value.
    let report = report_for(&[50, 50, 0, 255], 4, KMeansConfig::default()).await;
    assert_eq!(report, "[50.0] 50, 50\n[50.0]\n[0.0] 0\n[255.0] 255\n");
}

#[tokio::test]
async fn test_single_worker() {
    let report = report_for(&[42], 1, KMeansConfig::default().with_clusters(1)).await;
    assert_eq!(report, "[42.0] 42\n");
}

#[tokio::test]
async fn test_round_cap_stops_all_workers_together() {
    let data: Vec<u8> = vec![0, 10, 90, 100];
    let outcomes = run_local(
        Dataset::from_bytes(data),
        4,
        runtime(),
        KMeansConfig::default()
            .with_clusters(2)
            .with_max_rounds(Some(1)),
    )
    .await
    .unwrap();
    for o in &outcomes {
        assert!(!o.convergence.converged);
        assert_eq!(o.convergence.rounds, 1);
    }
}

#[tokio::test]
async fn test_dataset_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(&[10, 20, 200, 210, 1, 2, 3]).unwrap();

    let dataset = Dataset::load(file.path(), 4).await.unwrap();
    let outcomes = run_local(dataset, 4, runtime(), KMeansConfig::default())
        .await
        .unwrap();
    assert_eq!(
        outcomes[0].report.as_ref().unwrap().to_string(),
        "[10.0] 10\n[20.0] 20\n[200.0] 200\n[210.0] 210\n"
    );
}

#[tokio::test]
async fn test_file_with_more_clusters_than_workers() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(&[10, 200, 20, 210, 1, 2, 3, 4]).unwrap();

    let dataset = Dataset::load_for_run(file.path(), 2, 4).await.unwrap();
    let outcomes = run_local(dataset, 2, runtime(), KMeansConfig::default())
        .await
        .unwrap();
    assert_eq!(
        outcomes[0].report.as_ref().unwrap().to_string(),
        "[10.0] 10\n[200.0] 200\n[20.0]\n[210.0]\n"
    );
}

/// In-process sum over every participant sharing one instance.
///
/// Each call adds the caller's buffer into a shared accumulator, waits for
/// everyone, then copies the total back.
struct SharedSum {
    barrier: tokio::sync::Barrier,
    f32_acc: Mutex<Vec<f32>>,
    u32_acc: Mutex<Vec<u32>>,
}

impl SharedSum {
    fn new(participants: usize) -> Self {
        Self {
            barrier: tokio::sync::Barrier::new(participants),
            f32_acc: Mutex::new(Vec::new()),
            u32_acc: Mutex::new(Vec::new()),
        }
    }

    async fn sum<T>(&self, acc: &Mutex<Vec<T>>, buf: &mut [T]) -> Result<()>
    where
        T: Copy + Default + AddAssign + Send,
    {
        {
            let mut acc = acc.lock().unwrap();
            if acc.len() < buf.len() {
                acc.resize(buf.len(), T::default());
            }
            for (a, &b) in acc.iter_mut().zip(buf.iter()) {
                *a += b;
            }
        }
        self.barrier.wait().await;
        buf.copy_from_slice(&acc.lock().unwrap()[..buf.len()]);
        if self.barrier.wait().await.is_leader() {
            acc.lock().unwrap().clear();
        }
        self.barrier.wait().await;
        Ok(())
    }
}

impl SumReduce for SharedSum {
    fn sum_f32<'a>(&'a self, buf: &'a mut [f32]) -> BoxFuture<'a, Result<()>> {
        Box::pin(self.sum(&self.f32_acc, buf))
    }

    fn sum_u32<'a>(&'a self, buf: &'a mut [u32]) -> BoxFuture<'a, Result<()>> {
        Box::pin(self.sum(&self.u32_acc, buf))
    }
}

/// Run one engine per observation against a shared sum.
fn run_engines(observations: &[u8], config: KMeansConfig) -> Vec<Convergence> {
    let reducer = SharedSum::new(observations.len());
    let seeds = Centroids::from_seeds(&observations[..config.clusters]);
    let runs = observations.iter().map(|&o| {
        let engine = ConvergenceEngine::new(&reducer, o, seeds.clone(), config.clone()).unwrap();
        engine.run()
    });
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();
    rt.block_on(join_all(runs))
        .into_iter()
        .map(|r| r.unwrap())
        .collect()
}

fn any_layout() -> impl Strategy<Value = AggregateLayout> {
    prop_oneof![
        Just(AggregateLayout::Interleaved),
        Just(AggregateLayout::SeparateCounts),
    ]
}

proptest! {
    #[test]
    fn prop_engines_converge_and_agree(
        observations in prop::collection::vec(any::<u8>(), 4..32),
        clusters in 1usize..=4,
        layout in any_layout(),
    ) {
        let config = KMeansConfig::default()
            .with_clusters(clusters)
            .with_layout(layout)
            .with_max_rounds(Some(500));
        let outcomes = run_engines(&observations, config);

        let first = &outcomes[0];
        prop_assert!(first.converged, "no convergence after {} rounds", first.rounds);
        for o in &outcomes {
            prop_assert_eq!(bits(&o.centroids), bits(&first.centroids));
            prop_assert_eq!(o.rounds, first.rounds);
            prop_assert!(o.converged);
        }
        for c in first.centroids.as_slice() {
            prop_assert!((0.0..=255.0).contains(c));
        }
    }

    #[test]
    fn prop_membership_is_conserved(
        observations in prop::collection::vec(any::<u8>(), 4..32),
        layout in any_layout(),
    ) {
        let config = KMeansConfig::default()
            .with_layout(layout)
            .with_max_rounds(Some(500));
        let outcomes = run_engines(&observations, config);
        let centroids = &outcomes[0].centroids;

        // Every non-empty cluster's centroid is the mean of the workers
        // that chose it in the last round.
        for (k, &centroid) in centroids.as_slice().iter().enumerate() {
            let members: Vec<u8> = observations
                .iter()
                .zip(&outcomes)
                .filter(|(_, o)| o.assignment == k)
                .map(|(&obs, _)| obs)
                .collect();
            if !members.is_empty() {
                let sum: f32 = members.iter().map(|&m| f32::from(m)).sum();
                prop_assert_eq!(centroid, sum / members.len() as f32);
            }
        }

        let report = ClusterReport::build(centroids, &observations);
        let placed: usize = report.clusters().iter().map(|c| c.members.len()).sum();
        prop_assert_eq!(placed, observations.len());
    }
}
