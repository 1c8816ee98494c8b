//! Per-rank slice executor.
//!
//! A [`SliceExecutor`] owns one worker's slice and drives it through the pass
//! schedule: stencil, then a halo exchange if another pass follows. It does
//! not know whether it runs on the coordinator or a plain worker; the
//! scatter and gather around it are the caller's job.
//!
//! [`run_worker`] is the full program of every rank other than 0.

use tracing::{debug, warn};

use halo_net::Transport;
use halo_types::{Image, Partition, Tag};

use crate::error::{PipelineError, Result};
use crate::exchange::exchange_halo;
use crate::planner::compute_partition;
use crate::scheduler::{FilterPass, PassSchedule};
use crate::stencil::apply_stencil;
use crate::transport::{receive_header, recv_line, send_line};

/// Filter state for one slice on the local rank.
#[derive(Debug)]
pub struct SliceExecutor {
    partition: Partition,
    slice: Image,
    passes_completed: usize,
}

impl SliceExecutor {
    pub fn new(partition: Partition, slice: Image) -> Result<Self> {
        if slice.height() != partition.height() {
            return Err(PipelineError::Planning(format!(
                "rank {} slice has {} rows, partition needs {}",
                partition.rank,
                slice.height(),
                partition.height()
            )));
        }
        Ok(Self {
            partition,
            slice,
            passes_completed: 0,
        })
    }

    // ── Accessors ────────────────────────────────────────────────────────

    pub fn slice(&self) -> &Image {
        &self.slice
    }

    pub fn passes_completed(&self) -> usize {
        self.passes_completed
    }

    // ── Passes ───────────────────────────────────────────────────────────

    /// Filter the slice once and refresh its ghost rows if `pass` asks for it.
    pub fn run_pass<T>(&mut self, transport: &T, pass: &FilterPass) -> Result<()>
    where
        T: Transport + ?Sized,
    {
        self.slice = apply_stencil(&self.slice, pass.filter.kernel());
        self.passes_completed += 1;
        debug!(
            rank = self.partition.rank,
            pass = pass.index,
            filter = %pass.filter,
            "pass applied"
        );
        if pass.exchange_after {
            exchange_halo(transport, &mut self.slice)?;
        }
        Ok(())
    }

    pub fn run_schedule<T>(&mut self, transport: &T, schedule: &PassSchedule) -> Result<()>
    where
        T: Transport + ?Sized,
    {
        for pass in schedule.passes() {
            self.run_pass(transport, pass)?;
        }
        Ok(())
    }

    /// Send local rows `1..height-1` to the coordinator.
    pub fn send_interior<T>(&self, transport: &T) -> Result<()>
    where
        T: Transport + ?Sized,
    {
        let height = self.slice.height();
        for local in 1..height.saturating_sub(1) {
            send_line(transport, &self.slice, local, 0, Tag::End)?;
        }
        Ok(())
    }
}

// ── Worker program ────────────────────────────────────────────────────────────

/// Full lifecycle of a non-coordinator rank. Aborts the mesh on failure.
pub fn run_worker<T>(transport: &T, schedule: &PassSchedule) -> Result<()>
where
    T: Transport + ?Sized,
{
    let result = worker_body(transport, schedule);
    if let Err(ref e) = result {
        warn!(rank = transport.rank(), error = %e, "worker failed");
        transport.abort();
    }
    result
}

fn worker_body<T>(transport: &T, schedule: &PassSchedule) -> Result<()>
where
    T: Transport + ?Sized,
{
    let rank = transport.rank();
    let header = receive_header(transport)?;
    let partition = compute_partition(rank, transport.size(), header.height);

    let mut slice = Image::new(header.with_height(partition.height()))?;
    for local in 0..partition.height() {
        recv_line(transport, &mut slice, local, 0, Tag::Init)?;
    }
    debug!(rank, start = partition.start, end = partition.end, "slice received");
    transport.barrier()?;

    let mut executor = SliceExecutor::new(partition, slice)?;
    executor.run_schedule(transport, schedule)?;
    transport.barrier()?;

    executor.send_interior(transport)?;
    debug!(rank, passes = executor.passes_completed(), "worker finished");
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
