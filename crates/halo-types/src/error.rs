// Shared error type for the data model. Transport, codec and pipeline crates
// carry their own enums and convert from this one where needed.

#[derive(Debug, thiserror::Error)]
pub enum HaloError {
    // ── Image model ───────────────────────────────────────────────────────

    #[error("invalid image: {0}")]
    InvalidImage(String),

    // ── Filters ───────────────────────────────────────────────────────────

    #[error("unknown filter: {0:?} (expected one of smooth, blur, sharpen, mean, emboss)")]
    UnknownFilter(String),
}

/// Convenience alias used throughout this crate.
pub type Result<T> = std::result::Result<T, HaloError>;
