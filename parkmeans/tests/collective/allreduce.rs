use parkmeans::ReduceOp;

use super::helpers::run_collective;

#[tokio::test]
async fn test_allreduce_sum_f32_2_nodes() {
    run_collective(2, |client| async move {
        let rank = client.rank() as f32;
        let mut data = vec![rank + 1.0, (rank + 1.0) * 10.0];
        client.all_reduce(&mut data, ReduceOp::Sum).await.unwrap();
        assert_eq!(data, vec![3.0, 30.0]);
    })
    .await;
}

#[tokio::test]
async fn test_allreduce_sum_u32_non_power_of_two() {
    for world in [3u32, 5, 6, 7] {
        run_collective(world, move |client| async move {
            let rank = client.rank();
            let mut data = vec![rank, 1, 100];
            client.all_reduce(&mut data, ReduceOp::Sum).await.unwrap();
            let expected_sum: u32 = (0..world).sum();
            assert_eq!(
                data,
                vec![expected_sum, world, 100 * world],
                "rank {rank} of {world}"
            );
        })
        .await;
    }
}

#[tokio::test]
async fn test_allreduce_min_max() {
    run_collective(4, |client| async move {
        let rank = client.rank() as f64;
        let mut lo = vec![rank, -rank];
        let mut hi = lo.clone();
        client.all_reduce(&mut lo, ReduceOp::Min).await.unwrap();
        client.all_reduce(&mut hi, ReduceOp::Max).await.unwrap();
        assert_eq!(lo, vec![0.0, -3.0]);
        assert_eq!(hi, vec![3.0, 0.0]);
    })
    .await;
}

#[tokio::test]
async fn test_allreduce_is_bit_identical_across_ranks() {
    // Values whose float sum depends on association order.
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    run_collective(7, move |client| {
        let tx = tx.clone();
        async move {
            let rank = client.rank() as f32;
            let mut data = vec![0.1 * (rank + 1.0), 1.0e7 / (rank + 3.0), 1.0 / 3.0];
            client.all_reduce(&mut data, ReduceOp::Sum).await.unwrap();
            let bits: Vec<u32> = data.iter().map(|v| v.to_bits()).collect();
            tx.send(bits).unwrap();
        }
    })
    .await;

    let first = rx.recv().await.unwrap();
    let mut seen = 1;
    while let Ok(bits) = rx.try_recv() {
        assert_eq!(bits, first);
        seen += 1;
    }
    assert_eq!(seen, 7);
}

#[tokio::test]
async fn test_allreduce_single_node_is_identity() {
    run_collective(1, |client| async move {
        let mut data = vec![1.5f32, 2.5];
        client.all_reduce(&mut data, ReduceOp::Sum).await.unwrap();
        assert_eq!(data, vec![1.5, 2.5]);
    })
    .await;
}

#[tokio::test]
async fn test_many_allreduces_stay_in_step() {
    run_collective(4, |client| async move {
        for round in 0..50u32 {
            let mut data = vec![round];
            client.all_reduce(&mut data, ReduceOp::Sum).await.unwrap();
            assert_eq!(data, vec![round * 4]);
        }
    })
    .await;
}
