use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use super::helpers::run_collective;

#[tokio::test]
async fn test_barrier_waits_for_everyone() {
    let arrived = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&arrived);
    run_collective(4, move |client| {
        let arrived = Arc::clone(&counter);
        async move {
            // Stagger arrivals so late ranks would be overtaken without the barrier.
            tokio::time::sleep(Duration::from_millis(20 * u64::from(client.rank()))).await;
            arrived.fetch_add(1, Ordering::SeqCst);
            client.barrier().await.unwrap();
            assert_eq!(arrived.load(Ordering::SeqCst), 4);
        }
    })
    .await;
    assert_eq!(arrived.load(Ordering::SeqCst), 4);
}

#[tokio::test]
async fn test_repeated_barriers() {
    run_collective(3, |client| async move {
        for _ in 0..10 {
            client.barrier().await.unwrap();
        }
    })
    .await;
}
