use parkmeans::{Communicator, ParkmeansConfig};
use std::sync::Arc;
use std::time::Duration;

/// Helper: run a collective operation across N communicators concurrently.
/// Keeps all communicators alive until every task completes.
pub async fn run_collective<F, Fut>(world_size: u32, f: F)
where
    F: Fn(Arc<Communicator>) -> Fut + Send + Sync + 'static,
    Fut: std::future::Future<Output = ()> + Send + 'static,
{
    let comms = Communicator::bootstrap_local(world_size, test_config())
        .await
        .unwrap();
    let comms: Vec<Arc<Communicator>> = comms.into_iter().map(Arc::new).collect();

    let f = Arc::new(f);
    let mut handles = Vec::new();
    for c in &comms {
        let c = Arc::clone(c);
        let f = Arc::clone(&f);
        handles.push(tokio::spawn(async move { f(c).await }));
    }
    for h in handles {
        h.await.unwrap();
    }
}

/// Short timeouts so a hung collective fails the test instead of stalling it.
pub fn test_config() -> ParkmeansConfig {
    ParkmeansConfig {
        collective_timeout: Duration::from_secs(5),
        formation_timeout: Duration::from_secs(10),
    }
}
