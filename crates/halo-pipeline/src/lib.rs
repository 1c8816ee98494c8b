//! `halo-pipeline` — row-partitioned 3×3 stencil filtering.
//!
//! The image is cut into horizontal slices, one per worker. Each slice
//! carries one ghost row on every side that borders another slice, so the
//! stencil can run on the slice alone. Between passes neighbours swap their
//! edge rows to refresh those ghosts.
//!
//! # Architecture
//!
//! ```text
//!              header + Init rows               End rows
//! ┌────────────┐ ─────────────▶ ┌────────────┐ ─────────▶ ┌────────────┐
//! │  rank 0    │                │  rank 1    │            │  rank 0    │
//! │ rows 0..k  │ ◀── Lines ───▶ │ rows k-1.. │ ◀─ Lines ─▶│  output    │
//! └────────────┘                └────────────┘    ...     └────────────┘
//!   scatter          stencil ─▶ exchange ─▶ stencil           gather
//! ```
//!
//! Rank 0 is the coordinator and also filters its own slice.

pub mod coordinator;
pub mod error;
pub mod exchange;
pub mod executor;
pub mod planner;
pub mod scheduler;
pub mod session;
pub mod stencil;
pub mod transport;

// ── Public re-exports ────────────────────────────────────────────────────────

pub use coordinator::{filter_serial, FilterCoordinator};
pub use error::{PipelineError, Result};
pub use exchange::{exchange_halo, exchange_plan, BoundaryRow, ExchangeStep};
pub use executor::{run_worker, SliceExecutor};
pub use planner::{compute_partition, effective_workers, plan_partitions};
pub use scheduler::{FilterPass, PassSchedule};
pub use session::{RunSession, RunState};
pub use stencil::apply_stencil;
pub use transport::{broadcast_header, receive_header, recv_line, send_line};
