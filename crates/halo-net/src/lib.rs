// ── Module declarations ───────────────────────────────────────────────────────

pub mod codec;
pub mod error;
pub mod mesh;

// ── Public re-exports ─────────────────────────────────────────────────────────

pub use codec::{decode_line, encode_line};
pub use error::{NetError, Result};
pub use mesh::{LocalMesh, MeshBarrier, MeshEndpoint};

use halo_types::Tag;

// ── Transport ─────────────────────────────────────────────────────────────────

/// Blocking point-to-point transport between a fixed set of ranks.
///
/// Every operation blocks until it completes: `send` returns once the peer
/// has taken the payload, `recv` once a payload from `source` has arrived.
/// There are no timeouts; a stalled peer stalls the caller.
///
/// # Example
/// ```rust
/// use halo_net::{LocalMesh, Transport};
/// use halo_types::Tag;
///
/// let mut ranks = LocalMesh::build(2).unwrap();
/// let worker = ranks.pop().unwrap();
/// let coordinator = ranks.pop().unwrap();
///
/// std::thread::scope(|s| {
///     s.spawn(|| coordinator.send(1, Tag::Init, b"row".to_vec()).unwrap());
///     assert_eq!(worker.recv(0, Tag::Init).unwrap(), b"row");
/// });
/// ```
pub trait Transport {
    /// This participant's rank, `0..size()`. Rank 0 is the coordinator.
    fn rank(&self) -> usize;

    /// Number of participants in the mesh.
    fn size(&self) -> usize;

    /// Hand `payload` to `dest`, tagged with `tag`.
    fn send(&self, dest: usize, tag: Tag, payload: Vec<u8>) -> Result<()>;

    /// Take the next payload from `source`. Fails if its tag is not `tag`.
    fn recv(&self, source: usize, tag: Tag) -> Result<Vec<u8>>;

    /// Wait until every rank has reached the barrier.
    fn barrier(&self) -> Result<()>;

    /// Tear the mesh down after a fatal error so peers stop waiting.
    fn abort(&self);
}
