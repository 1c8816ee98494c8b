// Run configuration. Plain structs with defaults; the CLI overrides fields.

use std::num::NonZeroUsize;

use serde::{Deserialize, Serialize};

// ── Cluster ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct ClusterConfig {
    /// Requested number of workers, coordinator included. Capped to the image
    /// height at run time so every worker owns at least one row.
    /// Defaults to the machine's available parallelism.
    pub workers: usize,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        let workers = std::thread::available_parallelism()
            .map(NonZeroUsize::get)
            .unwrap_or(1);
        Self { workers }
    }
}

// ── Filters ───────────────────────────────────────────────────────────────────

/// What to do with a filter name outside the known set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownFilterPolicy {
    /// Fail before any work starts.
    #[default]
    Reject,
    /// Drop the name with a warning and keep the remaining chain.
    Skip,
}

#[derive(Debug, Clone, Default)]
pub struct FilterConfig {
    pub unknown_filter: UnknownFilterPolicy,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        assert!(ClusterConfig::default().workers >= 1);
        assert_eq!(FilterConfig::default().unknown_filter, UnknownFilterPolicy::Reject);
    }
}
