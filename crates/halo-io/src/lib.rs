//! `halo-io` — binary PNM codec and file helpers for the halo pipeline.
//!
//! The pipeline itself never touches files; this crate turns bytes on disk
//! into [`halo_types::Image`] values and back.

pub mod error;
pub mod pnm;
pub mod store;

pub use error::{ImageIoError, Result};
pub use pnm::{decode, encode};
pub use store::{read_image, write_image};
