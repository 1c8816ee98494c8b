use halo_net::NetError;
use halo_types::HaloError;

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("transport error: {0}")]
    Net(#[from] NetError),

    #[error(transparent)]
    Model(#[from] HaloError),

    #[error("planning error: {0}")]
    Planning(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("worker {rank} panicked")]
    WorkerPanicked { rank: usize },

    #[error("invalid state transition: {from} → {to}")]
    InvalidTransition { from: String, to: String },
}

impl PipelineError {
    /// True when this error only reports that some other participant failed.
    pub fn is_cascade(&self) -> bool {
        matches!(self, Self::Net(e) if e.is_cascade())
    }
}

/// Convenience alias used throughout this crate.
pub type Result<T> = std::result::Result<T, PipelineError>;
