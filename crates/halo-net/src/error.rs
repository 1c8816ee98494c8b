use halo_types::Tag;

/// Crate-local error type for mesh transport operations. Every variant is
/// fatal to the run: there is no retry path.
#[derive(Debug, thiserror::Error)]
pub enum NetError {
    #[error("tag mismatch from rank {peer}: expected {expected}, got {actual}")]
    TagMismatch {
        peer: usize,
        expected: Tag,
        actual: Tag,
    },

    #[error("line length mismatch: expected {expected} bytes, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("row {row} outside slice of height {height}")]
    RowOutOfRange { row: usize, height: usize },

    #[error("rank {peer} disconnected")]
    PeerDisconnected { peer: usize },

    #[error("invalid peer {peer} for rank {rank} in mesh of {size}")]
    InvalidPeer {
        rank: usize,
        peer: usize,
        size: usize,
    },

    #[error("mesh aborted by a failed participant")]
    Aborted,

    #[error("mesh configuration error: {0}")]
    Config(String),
}

impl NetError {
    /// True for errors that are a consequence of another participant
    /// failing rather than a fault observed first-hand.
    pub fn is_cascade(&self) -> bool {
        matches!(self, Self::Aborted | Self::PeerDisconnected { .. })
    }
}

/// Convenience alias used throughout this crate.
pub type Result<T> = std::result::Result<T, NetError>;
