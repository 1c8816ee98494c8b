// Row-partition and wire-tag types shared by the transport and the pipeline.

use std::fmt;
use std::ops::Range;

// ── Partition ─────────────────────────────────────────────────────────────────

/// Rows of the global image held by one worker.
///
/// `start..=end` is the slice as stored by the worker, ghost rows included.
/// `owned_start..owned_end` are the rows this worker is responsible for; the
/// owned ranges of all workers tile the image exactly once.
///
/// `Partition { start: 3, end: 7, owned_start: 4, owned_end: 7, .. }` holds
/// global rows 3..=7: row 3 is a ghost copy of the upper neighbour's last
/// owned row and row 7 a ghost copy of the lower neighbour's first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Partition {
    pub rank: usize,
    pub start: usize,
    pub end: usize,
    pub owned_start: usize,
    pub owned_end: usize,
}

impl Partition {
    /// Rows in the worker's slice, ghosts included.
    pub fn height(&self) -> usize {
        self.end - self.start + 1
    }

    pub fn owned_rows(&self) -> Range<usize> {
        self.owned_start..self.owned_end
    }

    /// Global rows a non-coordinator worker hands back after its last pass:
    /// the slice without its first and last row.
    pub fn gather_rows(&self) -> Range<usize> {
        (self.start + 1)..self.end.max(self.start + 1)
    }
}

// ── Tag ───────────────────────────────────────────────────────────────────────

/// Channel tag carried by every point-to-point message. Both ends of a
/// transfer must agree on it; a mismatch is a protocol violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
    /// Initial scatter of a worker's rows.
    Init,
    /// Ghost-row exchange between neighbouring slices.
    Lines,
    /// Final gather of interior rows to the coordinator.
    End,
    /// Image header broadcast.
    Header,
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Init   => write!(f, "init"),
            Self::Lines  => write!(f, "lines"),
            Self::End    => write!(f, "end"),
            Self::Header => write!(f, "header"),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
