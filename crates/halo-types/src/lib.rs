pub mod config;
pub mod error;
pub mod image;
pub mod kernel;
pub mod pipeline;

pub use error::HaloError;
pub use image::{Image, ImageFormat, ImageHeader, Pixel, MAX_CHANNELS};
pub use kernel::{FilterKind, Kernel};
pub use pipeline::{Partition, Tag};
