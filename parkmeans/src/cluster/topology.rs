use crate::types::Rank;
use std::collections::BTreeMap;

/// Mesh listen addresses of every worker, keyed by rank.
#[derive(Debug, Default, Clone)]
pub struct ClusterMap {
    peers: BTreeMap<Rank, String>,
}

impl ClusterMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a worker's mesh address. Re-registering a rank replaces it.
    pub fn add_peer(&mut self, rank: Rank, addr: String) {
        self.peers.insert(rank, addr);
    }

    /// All workers as `(rank, addr)` pairs in rank order.
    pub fn peers(&self) -> Vec<(Rank, String)> {
        self.peers
            .iter()
            .map(|(&rank, addr)| (rank, addr.clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_peers_in_rank_order() {
        let mut map = ClusterMap::new();
        map.add_peer(2, "127.0.0.1:5002".into());
        map.add_peer(0, "127.0.0.1:5000".into());
        map.add_peer(1, "127.0.0.1:5001".into());
        let ranks: Vec<Rank> = map.peers().into_iter().map(|(r, _)| r).collect();
        assert_eq!(ranks, vec![0, 1, 2]);
        assert_eq!(map.len(), 3);
        assert_eq!(map.peers()[1], (1, "127.0.0.1:5001".to_string()));
    }

    #[test]
    fn test_re_register_replaces() {
        let mut map = ClusterMap::new();
        assert!(map.is_empty());
        map.add_peer(0, "a".into());
        map.add_peer(0, "b".into());
        assert_eq!(map.len(), 1);
        assert_eq!(map.peers(), vec![(0, "b".to_string())]);
    }
}
