//! Size-based row partitioning across workers.
//!
//! Algorithm:
//! 1. Cap the worker count to the image height (each worker owns ≥ 1 row).
//! 2. Split `[0, H)` by floor division: rank `r` owns
//!    `[r*H/N, (r+1)*H/N)`.
//! 3. Widen each slice by one ghost row on every side that borders another
//!    worker, clamped to the image.

use halo_types::Partition;

/// Number of workers actually used for an image of `height` rows.
pub fn effective_workers(requested: usize, height: usize) -> usize {
    requested.max(1).min(height.max(1))
}

/// Row range of `rank` among `workers` for an image of `height` rows.
///
/// Pure arithmetic with no error cases. Callers that need every worker to
/// own at least one row cap `workers` through [`effective_workers`] first.
pub fn compute_partition(rank: usize, workers: usize, height: usize) -> Partition {
    let raw_start = rank * height / workers;
    let raw_end = (rank + 1) * height / workers;

    Partition {
        rank,
        start: raw_start.saturating_sub(1),
        end: raw_end.min(height.saturating_sub(1)),
        owned_start: raw_start,
        owned_end: raw_end,
    }
}

/// Partitions for every rank, in rank order.
pub fn plan_partitions(workers: usize, height: usize) -> Vec<Partition> {
    (0..workers)
        .map(|rank| compute_partition(rank, workers, height))
        .collect()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
