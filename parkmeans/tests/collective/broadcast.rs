use super::helpers::run_collective;

#[tokio::test]
async fn test_broadcast_from_root_0() {
    run_collective(3, |client| async move {
        let rank = client.rank();
        let mut data: Vec<f32> = if rank == 0 {
            vec![42.0, 43.0, 44.0, 45.0]
        } else {
            vec![0.0; 4]
        };

        client.broadcast(&mut data, 0).await.unwrap();

        assert_eq!(
            data,
            vec![42.0, 43.0, 44.0, 45.0],
            "rank {rank} broadcast failed"
        );
    })
    .await;
}

#[tokio::test]
async fn test_broadcast_from_nonzero_root() {
    run_collective(3, |client| async move {
        let rank = client.rank();
        let root = 2;
        let mut data: Vec<f32> = if rank == root {
            vec![99.0, 100.0, 101.0]
        } else {
            vec![0.0; 3]
        };

        client.broadcast(&mut data, root).await.unwrap();

        assert_eq!(
            data,
            vec![99.0, 100.0, 101.0],
            "rank {rank} broadcast from root {root} failed"
        );
    })
    .await;
}

#[tokio::test]
async fn test_broadcast_5_nodes_tree() {
    run_collective(5, |client| async move {
        let rank = client.rank();
        let mut data: Vec<u32> = if rank == 0 { vec![7, 8, 9] } else { vec![0; 3] };
        client.broadcast(&mut data, 0).await.unwrap();
        assert_eq!(data, vec![7, 8, 9], "rank {rank}");
    })
    .await;
}

#[tokio::test]
async fn test_broadcast_8_nodes_tree_nonzero_root() {
    run_collective(8, |client| async move {
        let rank = client.rank();
        let root = 5;
        let mut data: Vec<u8> = if rank == root { vec![1, 2, 3, 4, 5] } else { vec![0; 5] };
        client.broadcast(&mut data, root).await.unwrap();
        assert_eq!(data, vec![1, 2, 3, 4, 5], "rank {rank}");
    })
    .await;
}

#[tokio::test]
async fn test_broadcast_invalid_root() {
    run_collective(2, |client| async move {
        let mut data = vec![0f32; 2];
        assert!(client.broadcast(&mut data, 2).await.is_err());
    })
    .await;
}
