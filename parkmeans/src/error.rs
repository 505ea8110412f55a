use crate::types::Rank;

pub type Result<T> = std::result::Result<T, ParkmeansError>;

#[derive(Debug, thiserror::Error)]
pub enum ParkmeansError {
    #[error("dataset too small: {available} bytes available, {required} workers need one each")]
    DatasetTooSmall { available: usize, required: usize },

    #[error("dataset too small to seed centroids: {available} bytes available, {clusters} clusters")]
    TooFewSeeds { available: usize, clusters: usize },

    #[error("failed to load dataset {path}: {source}")]
    Dataset {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("connection to rank {rank} failed: {reason}")]
    ConnectionFailed { rank: Rank, reason: String },

    #[error("peer {rank} disconnected unexpectedly")]
    PeerDisconnected { rank: Rank },

    #[error("rank {rank} not found in cluster")]
    UnknownPeer { rank: Rank },

    #[error("computation aborted by rank {rank}: {reason}")]
    Aborted { rank: Rank, reason: String },

    #[error("protocol version mismatch: local={local}, remote={remote}")]
    ProtocolMismatch { local: u16, remote: u16 },

    #[error("message decode failed: {0}")]
    DecodeFailed(String),

    #[error("message encode failed: {0}")]
    EncodeFailed(String),

    #[error("cluster formation timed out: {joined}/{expected} nodes joined")]
    ClusterFormationTimeout { joined: u32, expected: u32 },

    #[error("buffer size mismatch: expected {expected} bytes, got {actual}")]
    BufferSizeMismatch { expected: usize, actual: usize },

    #[error("invalid rank {rank}: world size is {world_size}")]
    InvalidRank { rank: Rank, world_size: u32 },

    #[error("transport error: {message}")]
    Transport {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("{operation} failed at rank {rank}: {reason}")]
    CollectiveFailed {
        operation: &'static str,
        rank: Rank,
        reason: String,
    },
}

impl ParkmeansError {
    /// Create a `Transport` error with just a message.
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport {
            message: msg.into(),
            source: None,
        }
    }

    /// Create a `Transport` error with a message and a source error.
    pub fn transport_with_source(
        msg: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Transport {
            message: msg.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Whether this error came from a remote abort rather than a local failure.
    ///
    /// A rank that receives an abort does not re-broadcast it.
    pub fn is_remote_abort(&self) -> bool {
        matches!(self, Self::Aborted { .. })
    }
}
