//! Cluster 32 observations with 32 in-process workers.
//!
//! Each worker holds one byte. Workers only ever exchange collective sums,
//! yet all of them finish with the same centroids.
//!
//! ```bash
//! cargo run --example local_kmeans
//! ```

use parkmeans::{Dataset, KMeansConfig, ParkmeansConfig, run_local};

#[tokio::main]
async fn main() -> parkmeans::Result<()> {
    let workers = 32u32;

    // Four loose groups around 20, 90, 160 and 230.
    let bytes: Vec<u8> = (0..workers)
        .map(|i| {
            let centre = [20u32, 90, 160, 230][(i % 4) as usize];
            (centre + (i * 7) % 15) as u8
        })
        .collect();

    let outcomes = run_local(
        Dataset::from_bytes(bytes),
        workers,
        ParkmeansConfig::default(),
        KMeansConfig::default(),
    )
    .await?;

    let root = &outcomes[0];
    println!(
        "converged={} after {} rounds",
        root.convergence.converged, root.convergence.rounds
    );
    if let Some(report) = &root.report {
        print!("{report}");
    }

    for o in &outcomes {
        assert_eq!(o.convergence.centroids, root.convergence.centroids);
    }
    println!("all {} workers agree", outcomes.len());

    Ok(())
}
