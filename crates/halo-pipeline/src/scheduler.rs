//! Filter chain → ordered pass schedule.
//!
//! ```text
//! filters:   smooth    blur      emboss
//! pass:      [0] ──x── [1] ──x── [2]
//!                 halo      halo      (none after the last pass)
//! ```
//!
//! Every pass except the last is followed by one halo exchange round.

use tracing::warn;

use halo_types::config::UnknownFilterPolicy;
use halo_types::{FilterKind, HaloError};

use crate::error::Result;

/// One filter application within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterPass {
    /// Zero-based position in the chain.
    pub index: usize,
    pub filter: FilterKind,
    /// Whether ghost rows must be refreshed before the next pass.
    pub exchange_after: bool,
}

/// Deterministic sequence of passes shared by every worker.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassSchedule {
    passes: Vec<FilterPass>,
}

impl PassSchedule {
    pub fn new(filters: &[FilterKind]) -> Self {
        let last = filters.len().saturating_sub(1);
        let passes = filters
            .iter()
            .enumerate()
            .map(|(index, &filter)| FilterPass {
                index,
                filter,
                exchange_after: index < last,
            })
            .collect();
        Self { passes }
    }

    /// Parse filter names, applying `policy` to names outside the known set.
    pub fn from_names<S: AsRef<str>>(names: &[S], policy: UnknownFilterPolicy) -> Result<Self> {
        let mut filters = Vec::with_capacity(names.len());
        for name in names {
            let name = name.as_ref();
            match name.parse::<FilterKind>() {
                Ok(kind) => filters.push(kind),
                Err(HaloError::UnknownFilter(_)) if policy == UnknownFilterPolicy::Skip => {
                    warn!(filter = name, "skipping unknown filter");
                }
                Err(e) => return Err(e.into()),
            }
        }
        Ok(Self::new(&filters))
    }

    pub fn passes(&self) -> &[FilterPass] {
        &self.passes
    }

    pub fn len(&self) -> usize {
        self.passes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passes.is_empty()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;

    #[test]
    fn exchange_after_all_but_last() {
        let s = PassSchedule::new(&[FilterKind::Smooth, FilterKind::Blur, FilterKind::Emboss]);
        let flags: Vec<bool> = s.passes().iter().map(|p| p.exchange_after).collect();
        assert_eq!(flags, vec![true, true, false]);
        assert_eq!(s.passes()[2].index, 2);
    }

    #[test]
    fn single_and_empty_chains() {
        let one = PassSchedule::new(&[FilterKind::Mean]);
        assert!(!one.passes()[0].exchange_after);

        let none = PassSchedule::new(&[]);
        assert!(none.is_empty());
        assert_eq!(none.len(), 0);
    }

    #[test]
    fn unknown_names_rejected_by_default() {
        let err = PassSchedule::from_names(&["smooth", "sobel"], UnknownFilterPolicy::Reject)
            .unwrap_err();
        assert!(matches!(err, PipelineError::Model(HaloError::UnknownFilter(n)) if n == "sobel"));
    }

    #[test]
    fn unknown_names_skipped_when_lenient() {
        let names = ["sobel", "blur", "x", "sharpen"];
        let s = PassSchedule::from_names(&names, UnknownFilterPolicy::Skip).unwrap();
        let filters: Vec<FilterKind> = s.passes().iter().map(|p| p.filter).collect();
        assert_eq!(filters, vec![FilterKind::Blur, FilterKind::Sharpen]);
        assert!(s.passes()[0].exchange_after);
        assert!(!s.passes()[1].exchange_after);
    }
}
