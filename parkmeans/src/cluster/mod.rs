mod seed;
mod topology;
mod worker;

pub use seed::SeedNode;
pub use topology::ClusterMap;
pub use worker::WorkerNode;
