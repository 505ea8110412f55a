use parkmeans::ReduceOp;

use super::helpers::run_collective;

#[tokio::test]
async fn test_reduce_to_root_0() {
    run_collective(4, |client| async move {
        let rank = client.rank();
        let mut data = vec![rank as f32 + 1.0; 3];
        client.reduce(&mut data, ReduceOp::Sum, 0).await.unwrap();
        if rank == 0 {
            assert_eq!(data, vec![10.0; 3]);
        }
    })
    .await;
}

#[tokio::test]
async fn test_reduce_to_nonzero_root_odd_world() {
    run_collective(5, |client| async move {
        let rank = client.rank();
        let root = 3;
        let mut data = vec![rank, 2 * rank];
        client.reduce(&mut data, ReduceOp::Max, root).await.unwrap();
        if rank == root {
            assert_eq!(data, vec![4, 8]);
        } else {
            // Non-root buffers are left untouched.
            assert_eq!(data, vec![rank, 2 * rank]);
        }
    })
    .await;
}
