//! Ghost-row exchange between neighbouring slices.
//!
//! One round refreshes every worker's ghost rows from its neighbours:
//!
//! ```text
//!           rank r-1                 rank r                 rank r+1
//!       ┌──────────────┐
//!       │ ...          │
//!       │ last owned   │──────▶ top ghost    (local 0)
//!       │ bottom ghost │◀────── first owned  (local 1)
//!       └──────────────┘        ...
//!                               last owned   (local h-2) ──────▶ top ghost
//!                               bottom ghost (local h-1) ◀────── first owned
//! ```
//!
//! Phase 1 pairs a rank with its upper neighbour, phase 2 with its lower one.
//! Even ranks send before they receive, odd ranks receive before they send,
//! so every blocking send meets a peer that is already waiting to receive.

use tracing::debug;

use halo_net::Transport;
use halo_types::{Image, Tag};

use crate::error::Result;
use crate::transport::{recv_line, send_line};

// ── Plan ──────────────────────────────────────────────────────────────────────

/// A slice row that takes part in the exchange, named by its role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundaryRow {
    /// Local row 0, a copy of the upper neighbour's last owned row.
    TopGhost,
    /// Local row 1.
    FirstOwned,
    /// Local row `height - 2`.
    LastOwned,
    /// Local row `height - 1`, a copy of the lower neighbour's first owned row.
    BottomGhost,
}

impl BoundaryRow {
    pub fn local_index(self, slice_height: usize) -> usize {
        match self {
            Self::TopGhost => 0,
            Self::FirstOwned => 1,
            Self::LastOwned => slice_height.saturating_sub(2),
            Self::BottomGhost => slice_height.saturating_sub(1),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExchangeStep {
    Send { peer: usize, row: BoundaryRow },
    Recv { peer: usize, row: BoundaryRow },
}

/// Ordered transfers `rank` performs in one exchange round.
pub fn exchange_plan(rank: usize, workers: usize) -> Vec<ExchangeStep> {
    let even = rank % 2 == 0;
    let mut steps = Vec::with_capacity(4);

    if rank > 0 {
        let peer = rank - 1;
        let send = ExchangeStep::Send {
            peer,
            row: BoundaryRow::FirstOwned,
        };
        let recv = ExchangeStep::Recv {
            peer,
            row: BoundaryRow::TopGhost,
        };
        if even {
            steps.extend([send, recv]);
        } else {
            steps.extend([recv, send]);
        }
    }

    if rank + 1 < workers {
        let peer = rank + 1;
        let send = ExchangeStep::Send {
            peer,
            row: BoundaryRow::LastOwned,
        };
        let recv = ExchangeStep::Recv {
            peer,
            row: BoundaryRow::BottomGhost,
        };
        if even {
            steps.extend([send, recv]);
        } else {
            steps.extend([recv, send]);
        }
    }

    steps
}

// ── Execution ─────────────────────────────────────────────────────────────────

/// Run one full exchange round on `slice`, fenced by barriers on both sides.
pub fn exchange_halo<T>(transport: &T, slice: &mut Image) -> Result<()>
where
    T: Transport + ?Sized,
{
    let rank = transport.rank();
    let height = slice.height();

    transport.barrier()?;
    for step in exchange_plan(rank, transport.size()) {
        match step {
            ExchangeStep::Send { peer, row } => {
                send_line(transport, slice, row.local_index(height), peer, Tag::Lines)?;
            }
            ExchangeStep::Recv { peer, row } => {
                recv_line(transport, slice, row.local_index(height), peer, Tag::Lines)?;
            }
        }
    }
    transport.barrier()?;

    debug!(rank, "halo exchange complete");
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use halo_net::LocalMesh;
    use halo_types::{ImageFormat, ImageHeader, Pixel};
    use std::thread;

    fn send(peer: usize, row: BoundaryRow) -> ExchangeStep {
        ExchangeStep::Send { peer, row }
    }

    fn recv(peer: usize, row: BoundaryRow) -> ExchangeStep {
        ExchangeStep::Recv { peer, row }
    }

    /// Steps through all plans in lockstep with rendezvous semantics: a send
    /// only completes together with the matching receive on the peer.
    /// Returns the matched row pairs, or `None` if no rank can make progress.
    fn simulate(plans: &[Vec<ExchangeStep>]) -> Option<Vec<(BoundaryRow, BoundaryRow)>> {
        let mut pc = vec![0usize; plans.len()];
        let mut matched = Vec::new();

        loop {
            if pc.iter().zip(plans).all(|(&i, p)| i == p.len()) {
                return Some(matched);
            }
            let mut progressed = false;
            for a in 0..plans.len() {
                let Some(&ExchangeStep::Send { peer: b, row: sent }) = plans[a].get(pc[a]) else {
                    continue;
                };
                if let Some(&ExchangeStep::Recv { peer, row: received }) = plans[b].get(pc[b]) {
                    if peer == a {
                        matched.push((sent, received));
                        pc[a] += 1;
                        pc[b] += 1;
                        progressed = true;
                    }
                }
            }
            if !progressed {
                return None;
            }
        }
    }

    #[test]
    fn coordinator_only_talks_down() {
        assert_eq!(
            exchange_plan(0, 3),
            vec![
                send(1, BoundaryRow::LastOwned),
                recv(1, BoundaryRow::BottomGhost),
            ]
        );
        assert!(exchange_plan(0, 1).is_empty());
    }

    #[test]
    fn odd_rank_receives_first() {
        assert_eq!(
            exchange_plan(1, 3),
            vec![
                recv(0, BoundaryRow::TopGhost),
                send(0, BoundaryRow::FirstOwned),
                recv(2, BoundaryRow::BottomGhost),
                send(2, BoundaryRow::LastOwned),
            ]
        );
    }

    #[test]
    fn plans_complete_for_every_mesh_size() {
        for workers in 1..=16 {
            let plans: Vec<_> = (0..workers).map(|r| exchange_plan(r, workers)).collect();
            let matched = simulate(&plans)
                .unwrap_or_else(|| panic!("exchange stalls with {workers} workers"));
            assert_eq!(matched.len(), 2 * (workers - 1));
            for pair in matched {
                assert!(
                    matches!(
                        pair,
                        (BoundaryRow::FirstOwned, BoundaryRow::BottomGhost)
                            | (BoundaryRow::LastOwned, BoundaryRow::TopGhost)
                    ),
                    "{pair:?}"
                );
            }
        }
    }

    #[test]
    fn send_first_everywhere_stalls() {
        let naive = |rank: usize, workers: usize| {
            let mut steps = Vec::new();
            if rank > 0 {
                steps.push(send(rank - 1, BoundaryRow::FirstOwned));
                steps.push(recv(rank - 1, BoundaryRow::TopGhost));
            }
            if rank + 1 < workers {
                steps.push(send(rank + 1, BoundaryRow::LastOwned));
                steps.push(recv(rank + 1, BoundaryRow::BottomGhost));
            }
            steps
        };
        let plans: Vec<_> = (0..3).map(|r| naive(r, 3)).collect();
        assert!(simulate(&plans).is_none());
    }

    #[test]
    fn boundary_rows_on_short_slices() {
        assert_eq!(BoundaryRow::LastOwned.local_index(2), 0);
        assert_eq!(BoundaryRow::BottomGhost.local_index(2), 1);
        assert_eq!(BoundaryRow::FirstOwned.local_index(5), 1);
        assert_eq!(BoundaryRow::LastOwned.local_index(5), 3);
    }

    #[test]
    fn exchange_refreshes_ghosts_over_mesh() {
        // Three slices of height 4, each filled with 10 * (rank + 1) + local row.
        let slice = |rank: usize| {
            let hdr = ImageHeader::new(ImageFormat::Grayscale, 2, 4, 255);
            let raw: Vec<u8> = (0..4u8)
                .flat_map(|y| [10 * (rank as u8 + 1) + y; 2])
                .collect();
            Image::from_raw(hdr, &raw).unwrap()
        };

        let endpoints = LocalMesh::build(3).unwrap();
        let slices: Vec<Image> = thread::scope(|s| {
            let handles: Vec<_> = endpoints
                .iter()
                .enumerate()
                .map(|(rank, ep)| {
                    s.spawn(move || {
                        let mut img = slice(rank);
                        exchange_halo(ep, &mut img).unwrap();
                        img
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        let col = |img: &Image| -> Vec<u8> { (0..4).map(|y| img.get(0, y).0[0]).collect() };
        // rank 0: bottom ghost = rank 1's local 1
        assert_eq!(col(&slices[0]), vec![10, 11, 12, 21]);
        // rank 1: top ghost = rank 0's local 2, bottom ghost = rank 2's local 1
        assert_eq!(col(&slices[1]), vec![12, 21, 22, 31]);
        // rank 2: top ghost = rank 1's local 2, own bottom row untouched
        assert_eq!(col(&slices[2]), vec![22, 31, 32, 33]);
        assert_eq!(slices[2].get(1, 0), Pixel::gray(22));
    }
}
