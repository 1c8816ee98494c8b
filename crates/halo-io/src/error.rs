use std::io;

use halo_types::HaloError;

/// Crate-local error type for image decoding, encoding and file access.
#[derive(Debug, thiserror::Error)]
pub enum ImageIoError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("malformed PNM header: {0}")]
    Malformed(String),

    #[error("unsupported PNM variant: {0}")]
    Unsupported(String),

    #[error("truncated pixel data: expected {expected} bytes, got {actual}")]
    Truncated { expected: usize, actual: usize },

    #[error(transparent)]
    Image(#[from] HaloError),
}

/// Convenience alias used throughout this crate.
pub type Result<T> = std::result::Result<T, ImageIoError>;
