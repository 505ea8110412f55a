//! Manual cluster setup with seed and worker nodes.
//!
//! Instead of `run_local`, this shows how to set up a run the way you would
//! across real machines: start a seed node, connect workers to it, build
//! the worker mesh, then run k-means on each worker.
//!
//! ```bash
//! cargo run --example seed_worker
//! ```

use parkmeans::{
    Communicator, Dataset, KMeansConfig, ParkmeansConfig, SeedNode, WorkerNode, run_worker,
};
use std::net::SocketAddr;

#[tokio::main]
async fn main() -> parkmeans::Result<()> {
    let world_size = 4u32;
    let config = ParkmeansConfig::default();

    // Step 1: Start the seed node on a local address.
    let seed_addr: SocketAddr = "127.0.0.1:0".parse().unwrap();
    let seed = SeedNode::bind(seed_addr, world_size).await?;
    let seed_addr = seed.local_addr();
    println!("seed listening on {seed_addr}");

    let seed_handle = tokio::spawn(async move { seed.form_cluster().await });

    // Step 2: Each worker joins the seed, builds its mesh, and runs.
    let mut workers = Vec::new();
    for _ in 0..world_size {
        let config = config.clone();
        workers.push(tokio::spawn(async move {
            let listen: SocketAddr = "127.0.0.1:0".parse().unwrap();
            let node = WorkerNode::connect(seed_addr, listen, config.formation_timeout).await?;
            println!("worker rank={} peers={:?}", node.rank, node.peers);

            let comm = Communicator::join(node, config).await?;
            // Only rank 0 reads the data.
            let dataset = comm
                .is_root()
                .then(|| Dataset::from_bytes([10u8, 20, 200, 210]));
            run_worker(&comm, dataset.as_ref(), &KMeansConfig::default()).await
        }));
    }

    let map = seed_handle.await.unwrap()?;
    println!("cluster formed: {} nodes", map.len());

    for w in workers {
        let outcome = w.await.unwrap()?;
        if let Some(report) = outcome.report {
            print!("{report}");
        }
    }

    Ok(())
}
