use crate::types::Rank;

/// Control messages exchanged during cluster formation and teardown.
///
/// Collective payloads do NOT flow through this enum. They travel as
/// `RawData` frames carrying a sequence tag and raw little-endian bytes.
#[derive(rkyv::Archive, rkyv::Serialize, rkyv::Deserialize, Debug, Clone, PartialEq)]
pub enum WireMessage {
    /// Initial handshake from worker to seed, advertising the worker's mesh listener.
    Hello {
        protocol_version: u16,
        listen_addr: String,
    },

    /// Seed's response with rank assignment and peer table.
    Welcome {
        rank: Rank,
        world_size: u32,
        /// `(rank, socket_addr_string)` for each worker, including the recipient.
        peers: Vec<(Rank, String)>,
    },

    /// First frame on a mesh connection, identifying the connecting rank.
    MeshHello { rank: Rank },

    /// The sender is tearing the computation down; the receiver must stop too.
    Abort { reason: String },
}
