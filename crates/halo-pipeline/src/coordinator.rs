//! Run driver.
//!
//! Lifecycle of one filtering run:
//! 1. Cap the worker count to the image height and plan partitions
//! 2. One worker: filter the whole image serially, no transport involved
//! 3. Otherwise build a local mesh, spawn ranks `1..N` on scoped threads and
//!    run rank 0 on the calling thread:
//!    broadcast header → scatter slices → barrier → passes → barrier → gather
//! 4. Join every rank and report the most specific failure
//!
//! The coordinator keeps the input image read-only; the output starts as a
//! copy of it and receives the owned rows of every slice.

use std::thread::{self, ScopedJoinHandle};

use tracing::{debug, info, warn};

use halo_net::{LocalMesh, Transport};
use halo_types::config::ClusterConfig;
use halo_types::{Image, Partition, Tag};

use crate::error::{PipelineError, Result};
use crate::executor::{run_worker, SliceExecutor};
use crate::planner::{effective_workers, plan_partitions};
use crate::scheduler::PassSchedule;
use crate::session::RunSession;
use crate::stencil::apply_stencil;
use crate::transport::{broadcast_header, recv_line, send_line};

// ── Coordinator ───────────────────────────────────────────────────────────────

pub struct FilterCoordinator {
    config: ClusterConfig,
}

impl FilterCoordinator {
    pub fn new(config: ClusterConfig) -> Self {
        Self { config }
    }

    /// Apply every pass of `schedule` to `image`.
    ///
    /// Returns the filtered image and the completed session. On failure the
    /// whole run fails; no partial image is returned.
    pub fn run(&self, image: &Image, schedule: &PassSchedule) -> Result<(Image, RunSession)> {
        let workers = effective_workers(self.config.workers, image.height());
        if workers != self.config.workers {
            debug!(
                requested = self.config.workers,
                workers,
                height = image.height(),
                "worker count capped"
            );
        }
        let mut session = RunSession::new(plan_partitions(workers, image.height()));

        info!(
            run_id = %session.run_id,
            workers,
            passes = schedule.len(),
            width = image.width(),
            height = image.height(),
            "run planned"
        );

        let result = if workers == 1 {
            filter_serial(image, schedule, &mut session)
        } else {
            run_distributed(image, schedule, &mut session)
        };

        match result {
            Ok(output) => {
                session.complete()?;
                info!(run_id = %session.run_id, passes = session.passes_completed, "run completed");
                Ok((output, session))
            }
            Err(e) => {
                session.fail(&e.to_string());
                warn!(run_id = %session.run_id, error = %e, "run failed");
                Err(e)
            }
        }
    }
}

// ── Serial path ───────────────────────────────────────────────────────────────

/// Feed each pass's output into the next one on the calling thread.
pub fn filter_serial(
    image: &Image,
    schedule: &PassSchedule,
    session: &mut RunSession,
) -> Result<Image> {
    session.start_filtering()?;
    let mut current = image.clone();
    for pass in schedule.passes() {
        current = apply_stencil(&current, pass.filter.kernel());
        session.record_pass()?;
    }
    session.mark_gathered()?;
    Ok(current)
}

// ── Distributed path ──────────────────────────────────────────────────────────

fn run_distributed(
    image: &Image,
    schedule: &PassSchedule,
    session: &mut RunSession,
) -> Result<Image> {
    let mut endpoints = LocalMesh::build(session.workers)?.into_iter();
    let coordinator = endpoints
        .next()
        .ok_or_else(|| PipelineError::Planning("mesh has no rank 0".into()))?;

    let (coordinator_result, worker_errors) = thread::scope(|s| {
        let workers: Vec<_> = endpoints
            .map(|endpoint| {
                let rank = endpoint.rank();
                (rank, s.spawn(move || run_worker(&endpoint, schedule)))
            })
            .collect();

        let coordinator_result = run_coordinator(coordinator, image, schedule, session);
        (coordinator_result, join_workers(workers))
    });

    resolve(coordinator_result, worker_errors)
}

/// Join every worker, turning a panic into [`PipelineError::WorkerPanicked`].
fn join_workers(workers: Vec<(usize, ScopedJoinHandle<'_, Result<()>>)>) -> Vec<PipelineError> {
    let mut errors = Vec::new();
    for (rank, handle) in workers {
        match handle.join() {
            Ok(Ok(())) => {}
            Ok(Err(e)) => errors.push(e),
            Err(_) => errors.push(PipelineError::WorkerPanicked { rank }),
        }
    }
    errors
}

fn resolve(coordinator_result: Result<Image>, worker_errors: Vec<PipelineError>) -> Result<Image> {
    let mut worker_errors = worker_errors.into_iter();
    match coordinator_result {
        Ok(output) => match worker_errors.next() {
            None => Ok(output),
            Some(first) => Err(root_cause(first, worker_errors)),
        },
        Err(e) => Err(root_cause(e, worker_errors)),
    }
}

/// `first` unless it merely reacts to another rank failing and `rest` holds
/// an error that does not.
fn root_cause(
    first: PipelineError,
    mut rest: impl Iterator<Item = PipelineError>,
) -> PipelineError {
    if !first.is_cascade() {
        return first;
    }
    rest.find(|e| !e.is_cascade()).unwrap_or(first)
}

/// Rank 0's program. Consumes the endpoint so its channels close on return.
fn run_coordinator<T: Transport>(
    transport: T,
    image: &Image,
    schedule: &PassSchedule,
    session: &mut RunSession,
) -> Result<Image> {
    let result = coordinate(&transport, image, schedule, session);
    if let Err(ref e) = result {
        warn!(rank = 0, error = %e, "coordinator failed");
        transport.abort();
    }
    result
}

fn coordinate<T: Transport>(
    transport: &T,
    image: &Image,
    schedule: &PassSchedule,
    session: &mut RunSession,
) -> Result<Image> {
    let partitions = session.partitions.clone();
    let (own, others) = partitions
        .split_first()
        .ok_or_else(|| PipelineError::Planning("no partitions".into()))?;

    broadcast_header(transport, image.header())?;
    scatter(transport, image, others)?;
    session.mark_scattered()?;
    transport.barrier()?;

    let slice = image.slice_rows(own.start..own.end + 1)?;
    let mut executor = SliceExecutor::new(*own, slice)?;
    session.start_filtering()?;
    for pass in schedule.passes() {
        executor.run_pass(transport, pass)?;
        session.record_pass()?;
    }
    transport.barrier()?;

    let mut output = image.clone();
    let local_owned = (own.owned_start - own.start)..(own.owned_end - own.start);
    output.copy_rows_from(executor.slice(), local_owned, own.owned_start)?;
    gather(transport, &mut output, others)?;
    session.mark_gathered()?;
    Ok(output)
}

fn scatter<T: Transport>(transport: &T, image: &Image, partitions: &[Partition]) -> Result<()> {
    for p in partitions {
        for row in p.start..=p.end {
            send_line(transport, image, row, p.rank, Tag::Init)?;
        }
        debug!(rank = p.rank, start = p.start, end = p.end, "slice scattered");
    }
    Ok(())
}

fn gather<T: Transport>(transport: &T, output: &mut Image, partitions: &[Partition]) -> Result<()> {
    for p in partitions {
        for row in p.gather_rows() {
            recv_line(transport, output, row, p.rank, Tag::End)?;
        }
        debug!(rank = p.rank, rows = p.gather_rows().len(), "slice gathered");
    }
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
