use std::fmt;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use halo_types::Partition;

use crate::error::{PipelineError, Result};

// ── Run State Machine ─────────────────────────────────────────────────────────

/// Planned → Scattered → Filtering → Gathered → Completed | Failed
///
/// A single-worker run has nothing to scatter and goes straight from
/// `Planned` to `Filtering`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// Partitions computed; no rows have moved.
    Planned,
    /// Every worker holds its slice.
    Scattered,
    /// Filter passes are running.
    Filtering,
    /// Interior rows are back on the coordinator.
    Gathered,
    Completed,
    /// A participant failed; the run produced no output.
    Failed,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Planned   => write!(f, "Planned"),
            Self::Scattered => write!(f, "Scattered"),
            Self::Filtering => write!(f, "Filtering"),
            Self::Gathered  => write!(f, "Gathered"),
            Self::Completed => write!(f, "Completed"),
            Self::Failed    => write!(f, "Failed"),
        }
    }
}

// ── Run Session ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct RunSession {
    pub run_id: Uuid,
    pub created_at: DateTime<Utc>,
    /// Effective worker count, coordinator included.
    pub workers: usize,
    pub partitions: Vec<Partition>,
    pub state: RunState,
    pub passes_completed: usize,
    pub failure_reason: Option<String>,
}

impl RunSession {
    pub fn new(partitions: Vec<Partition>) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            created_at: Utc::now(),
            workers: partitions.len(),
            partitions,
            state: RunState::Planned,
            passes_completed: 0,
            failure_reason: None,
        }
    }

    fn advance(&mut self, from: &[RunState], to: RunState) -> Result<()> {
        if !from.contains(&self.state) {
            return Err(PipelineError::InvalidTransition {
                from: self.state.to_string(),
                to: to.to_string(),
            });
        }
        self.state = to;
        Ok(())
    }

    /// `Planned → Scattered`.
    pub fn mark_scattered(&mut self) -> Result<()> {
        self.advance(&[RunState::Planned], RunState::Scattered)
    }

    /// `Scattered → Filtering`, or `Planned → Filtering` for a serial run.
    pub fn start_filtering(&mut self) -> Result<()> {
        if self.workers <= 1 {
            self.advance(&[RunState::Planned, RunState::Scattered], RunState::Filtering)
        } else {
            self.advance(&[RunState::Scattered], RunState::Filtering)
        }
    }

    /// Count one finished filter pass on the coordinator.
    pub fn record_pass(&mut self) -> Result<()> {
        if self.state != RunState::Filtering {
            return Err(PipelineError::InvalidTransition {
                from: self.state.to_string(),
                to: "recording a pass".into(),
            });
        }
        self.passes_completed += 1;
        Ok(())
    }

    /// `Filtering → Gathered`.
    pub fn mark_gathered(&mut self) -> Result<()> {
        self.advance(&[RunState::Filtering], RunState::Gathered)
    }

    /// `Gathered → Completed`.
    pub fn complete(&mut self) -> Result<()> {
        self.advance(&[RunState::Gathered], RunState::Completed)
    }

    /// Mark the run as failed with a reason. Valid from any state.
    pub fn fail(&mut self, reason: &str) {
        self.state = RunState::Failed;
        self.failure_reason = Some(reason.to_string());
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::plan_partitions;

    #[test]
    fn distributed_happy_path() {
        let mut s = RunSession::new(plan_partitions(3, 12));
        assert_eq!(s.workers, 3);
        assert_eq!(s.state, RunState::Planned);

        s.mark_scattered().unwrap();
        s.start_filtering().unwrap();
        s.record_pass().unwrap();
        s.record_pass().unwrap();
        s.mark_gathered().unwrap();
        s.complete().unwrap();

        assert_eq!(s.state, RunState::Completed);
        assert_eq!(s.passes_completed, 2);
    }

    #[test]
    fn serial_run_skips_scatter() {
        let mut s = RunSession::new(plan_partitions(1, 5));
        s.start_filtering().unwrap();
        s.mark_gathered().unwrap();
        s.complete().unwrap();
    }

    #[test]
    fn distributed_run_must_scatter_first() {
        let mut s = RunSession::new(plan_partitions(2, 5));
        let err = s.start_filtering().unwrap_err();
        assert!(matches!(
            err,
            PipelineError::InvalidTransition { ref from, ref to }
                if from == "Planned" && to == "Filtering"
        ));
        assert!(s.record_pass().is_err());
        assert!(s.complete().is_err());
    }

    #[test]
    fn fail_sets_reason() {
        let mut s = RunSession::new(plan_partitions(2, 5));
        s.mark_scattered().unwrap();
        s.fail("rank 1 disconnected");
        assert_eq!(s.state, RunState::Failed);
        assert_eq!(s.failure_reason.as_deref(), Some("rank 1 disconnected"));
        assert!(s.mark_gathered().is_err());
    }

    #[test]
    fn run_ids_are_unique() {
        let a = RunSession::new(plan_partitions(1, 1));
        let b = RunSession::new(plan_partitions(1, 1));
        assert_ne!(a.run_id, b.run_id);
    }
}
