//! On-disk image files.
//!
//! Thin wrappers over [`crate::pnm`]: read a whole file into memory, decode;
//! encode, write. Parent directories are created on write.

use std::fs;
use std::path::Path;

use halo_types::Image;
use tracing::debug;

use crate::error::Result;
use crate::pnm;

/// Read and decode a binary PNM file.
pub fn read_image(path: &Path) -> Result<Image> {
    let data = fs::read(path)?;
    let image = pnm::decode(&data)?;
    debug!(
        path = %path.display(),
        format = %image.format(),
        width = image.width(),
        height = image.height(),
        "image decoded"
    );
    Ok(image)
}

/// Encode `image` and write it to `path`, replacing any existing file.
pub fn write_image(path: &Path, image: &Image) -> Result<()> {
    ensure_parent_dir(path)?;
    let bytes = pnm::encode(image);
    fs::write(path, &bytes)?;
    debug!(path = %path.display(), bytes = bytes.len(), "image written");
    Ok(())
}

fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
