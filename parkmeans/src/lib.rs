pub mod client;
pub mod cluster;
pub(crate) mod collective;
pub mod config;
pub mod error;
pub mod kmeans;
pub mod protocol;
pub mod reduce;
pub mod transport;
pub mod types;

pub use client::Communicator;
pub use cluster::{ClusterMap, SeedNode, WorkerNode};
pub use config::{AggregateLayout, EPSILON_COARSE, EPSILON_FINE, KMeansConfig, ParkmeansConfig};
pub use error::{ParkmeansError, Result};
pub use kmeans::{
    ClusterReport, Convergence, Dataset, SumReduce, WorkerOutcome, run_local, run_worker,
};
pub use protocol::WireMessage;
pub use reduce::Element;
pub use transport::{PeerConnection, TransportListener};
pub use types::{DataType, ROOT_RANK, Rank, ReduceOp};
