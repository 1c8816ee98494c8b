//! In-process mesh of worker endpoints.
//!
//! Every ordered pair of ranks `(a, b)` gets its own zero-capacity channel, so
//! a send blocks until the peer takes the message and messages between two
//! ranks arrive in the order they were sent. All ranks share one abortable
//! barrier.
//!
//! Because the channels are rendezvous channels, two ranks that both try to
//! send to each other first will block forever. Callers are responsible for
//! ordering their transfers; the halo exchange plan does exactly that.

use std::sync::Arc;

use flume::{Receiver, Sender};
use parking_lot::{Condvar, Mutex};
use tracing::{debug, warn};

use halo_types::Tag;

use crate::error::{NetError, Result};
use crate::Transport;

// ── Envelope ──────────────────────────────────────────────────────────────────

/// A tagged payload in flight between two ranks.
#[derive(Debug)]
struct Envelope {
    tag: Tag,
    payload: Vec<u8>,
}

// ── Barrier ───────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct BarrierState {
    arrived: usize,
    generation: u64,
    aborted: bool,
}

/// Reusable barrier that can be torn down by any participant.
///
/// Once aborted, every current and future [`MeshBarrier::wait`] returns
/// [`NetError::Aborted`].
#[derive(Debug)]
pub struct MeshBarrier {
    parties: usize,
    state: Mutex<BarrierState>,
    cvar: Condvar,
}

impl MeshBarrier {
    pub fn new(parties: usize) -> Self {
        Self {
            parties,
            state: Mutex::new(BarrierState::default()),
            cvar: Condvar::new(),
        }
    }

    pub fn wait(&self) -> Result<()> {
        let mut state = self.state.lock();
        if state.aborted {
            return Err(NetError::Aborted);
        }
        let generation = state.generation;
        state.arrived += 1;
        if state.arrived == self.parties {
            state.arrived = 0;
            state.generation += 1;
            self.cvar.notify_all();
            return Ok(());
        }
        while state.generation == generation && !state.aborted {
            self.cvar.wait(&mut state);
        }
        if state.generation == generation {
            return Err(NetError::Aborted);
        }
        Ok(())
    }

    pub fn abort(&self) {
        let mut state = self.state.lock();
        state.aborted = true;
        self.cvar.notify_all();
    }

    pub fn is_aborted(&self) -> bool {
        self.state.lock().aborted
    }
}

// ── Endpoint ──────────────────────────────────────────────────────────────────

/// One rank's view of the mesh. Owned by exactly one worker thread.
///
/// Dropping an endpoint disconnects its channels. Dropping it while the
/// thread is panicking also aborts the barrier so no peer waits forever.
#[derive(Debug)]
pub struct MeshEndpoint {
    rank: usize,
    size: usize,
    /// `outbound[peer]`: channel carrying our messages to `peer`.
    outbound: Vec<Option<Sender<Envelope>>>,
    /// `inbound[peer]`: channel carrying `peer`'s messages to us.
    inbound: Vec<Option<Receiver<Envelope>>>,
    barrier: Arc<MeshBarrier>,
}

impl MeshEndpoint {
    fn check_peer(&self, peer: usize) -> Result<()> {
        if peer >= self.size || peer == self.rank {
            return Err(NetError::InvalidPeer {
                rank: self.rank,
                peer,
                size: self.size,
            });
        }
        Ok(())
    }
}

impl Transport for MeshEndpoint {
    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.size
    }

    fn send(&self, dest: usize, tag: Tag, payload: Vec<u8>) -> Result<()> {
        self.check_peer(dest)?;
        let tx = self.outbound[dest]
            .as_ref()
            .ok_or(NetError::PeerDisconnected { peer: dest })?;
        tx.send(Envelope { tag, payload })
            .map_err(|_| NetError::PeerDisconnected { peer: dest })
    }

    fn recv(&self, source: usize, tag: Tag) -> Result<Vec<u8>> {
        self.check_peer(source)?;
        let rx = self.inbound[source]
            .as_ref()
            .ok_or(NetError::PeerDisconnected { peer: source })?;
        let envelope = rx
            .recv()
            .map_err(|_| NetError::PeerDisconnected { peer: source })?;
        if envelope.tag != tag {
            return Err(NetError::TagMismatch {
                peer: source,
                expected: tag,
                actual: envelope.tag,
            });
        }
        Ok(envelope.payload)
    }

    fn barrier(&self) -> Result<()> {
        self.barrier.wait()
    }

    fn abort(&self) {
        if !self.barrier.is_aborted() {
            warn!(rank = self.rank, "aborting mesh");
        }
        self.barrier.abort();
    }
}

impl Drop for MeshEndpoint {
    fn drop(&mut self) {
        if std::thread::panicking() {
            self.abort();
        }
    }
}

// ── Mesh construction ─────────────────────────────────────────────────────────

pub struct LocalMesh;

impl LocalMesh {
    /// Build `size` fully connected endpoints, indexed by rank.
    pub fn build(size: usize) -> Result<Vec<MeshEndpoint>> {
        if size == 0 {
            return Err(NetError::Config("mesh needs at least one rank".into()));
        }

        let mut outbound: Vec<Vec<Option<Sender<Envelope>>>> =
            (0..size).map(|_| (0..size).map(|_| None).collect()).collect();
        let mut inbound: Vec<Vec<Option<Receiver<Envelope>>>> =
            (0..size).map(|_| (0..size).map(|_| None).collect()).collect();

        for from in 0..size {
            for to in 0..size {
                if from == to {
                    continue;
                }
                let (tx, rx) = flume::bounded(0);
                outbound[from][to] = Some(tx);
                inbound[to][from] = Some(rx);
            }
        }

        let barrier = Arc::new(MeshBarrier::new(size));
        let endpoints = outbound
            .into_iter()
            .zip(inbound)
            .enumerate()
            .map(|(rank, (outbound, inbound))| MeshEndpoint {
                rank,
                size,
                outbound,
                inbound,
                barrier: Arc::clone(&barrier),
            })
            .collect();

        debug!(size, "local mesh built");
        Ok(endpoints)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
