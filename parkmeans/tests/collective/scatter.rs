use super::helpers::run_collective;

#[tokio::test]
async fn test_scatter_one_byte_each() {
    run_collective(4, |client| async move {
        let rank = client.rank();
        let send: Vec<u8> = if rank == 0 { vec![10, 20, 200, 210] } else { vec![] };
        let mut recv = [0u8];
        client.scatter(&send, &mut recv, 0).await.unwrap();
        assert_eq!(recv[0], [10u8, 20, 200, 210][rank as usize]);
    })
    .await;
}

#[tokio::test]
async fn test_scatter_chunks_from_nonzero_root() {
    run_collective(3, |client| async move {
        let rank = client.rank();
        let root = 1;
        let send: Vec<f32> = if rank == root {
            (0..6).map(|i| i as f32).collect()
        } else {
            vec![]
        };
        let mut recv = [0f32; 2];
        client.scatter(&send, &mut recv, root).await.unwrap();
        let base = 2.0 * rank as f32;
        assert_eq!(recv, [base, base + 1.0]);
    })
    .await;
}

#[tokio::test]
async fn test_scatter_single_node() {
    run_collective(1, |client| async move {
        let mut recv = [0u8];
        client.scatter(&[9u8], &mut recv, 0).await.unwrap();
        assert_eq!(recv, [9]);
    })
    .await;
}
