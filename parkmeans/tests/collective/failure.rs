use parkmeans::{Communicator, ParkmeansConfig, ParkmeansError, ReduceOp};
use std::time::Duration;

use super::helpers::test_config;

#[tokio::test]
async fn test_abort_interrupts_pending_collective() {
    let mut comms = Communicator::bootstrap_local(3, test_config()).await.unwrap();
    let c2 = comms.pop().unwrap();
    let c1 = comms.pop().unwrap();
    let c0 = comms.pop().unwrap();

    let waiter = tokio::spawn(async move {
        let mut recv = [0u8];
        let err = c1.scatter(&[], &mut recv, 0).await.unwrap_err();
        drop(c2);
        err
    });

    tokio::time::sleep(Duration::from_millis(50)).await;
    c0.abort("input file is too small").await;

    let err = waiter.await.unwrap();
    assert!(
        matches!(&err, ParkmeansError::Aborted { rank: 0, reason } if reason.contains("too small")),
        "got {err:?}"
    );
    assert!(err.is_remote_abort());
}

#[tokio::test]
async fn test_dropped_peer_fails_collective() {
    let mut comms = Communicator::bootstrap_local(2, test_config()).await.unwrap();
    let c1 = comms.pop().unwrap();
    let c0 = comms.pop().unwrap();
    drop(c1);

    let mut data = vec![1.0f32];
    let err = c0.all_reduce(&mut data, ReduceOp::Sum).await.unwrap_err();
    assert!(
        matches!(err, ParkmeansError::CollectiveFailed { .. }),
        "got {err:?}"
    );
}

#[tokio::test]
async fn test_missing_participant_times_out() {
    let config = ParkmeansConfig {
        collective_timeout: Duration::from_millis(200),
        ..test_config()
    };
    let mut comms = Communicator::bootstrap_local(2, config).await.unwrap();
    let _c1 = comms.pop().unwrap();
    let c0 = comms.pop().unwrap();

    // Rank 1 never joins the barrier.
    let err = c0.barrier().await.unwrap_err();
    assert!(err.to_string().contains("timed out"), "got {err}");
}

#[tokio::test]
async fn test_out_of_step_collectives_are_detected() {
    let mut comms = Communicator::bootstrap_local(2, test_config()).await.unwrap();
    let c1 = comms.pop().unwrap();
    let c0 = comms.pop().unwrap();

    // Rank 0 runs an extra barrier that rank 1 skips.
    let t0 = tokio::spawn(async move {
        let _ = c0.barrier().await;
        let mut data = vec![1u32];
        let _ = c0.all_reduce(&mut data, ReduceOp::Sum).await;
        c0
    });
    let mut data = vec![1u32];
    let err = c1.all_reduce(&mut data, ReduceOp::Sum).await.unwrap_err();
    assert!(err.to_string().contains("out of step"), "got {err}");
    drop(c1);
    let _ = t0.await;
}

#[tokio::test]
async fn test_barrier_rejects_payload_from_other_collective() {
    let mut comms = Communicator::bootstrap_local(2, test_config()).await.unwrap();
    let c1 = comms.pop().unwrap();
    let c0 = comms.pop().unwrap();

    // Both ranks are on tag 1, but rank 1 sends an all_reduce contribution.
    let t1 = tokio::spawn(async move {
        let mut data = vec![1.0f32; 8];
        let _ = c1.all_reduce(&mut data, ReduceOp::Sum).await;
    });
    let err = c0.barrier().await.unwrap_err();
    assert!(
        matches!(
            err,
            ParkmeansError::BufferSizeMismatch {
                expected: 0,
                actual: 32
            }
        ),
        "got {err}"
    );
    drop(c0);
    let _ = t1.await;
}
