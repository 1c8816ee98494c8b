//! Header broadcast and row transfers over a [`Transport`].
//!
//! The header is serialized with bincode (serde mode, standard config) and
//! validated on receipt. Rows travel as raw line buffers produced by
//! [`halo_net::encode_line`].

use tracing::debug;

use halo_net::{decode_line, encode_line, Transport};
use halo_types::{Image, ImageHeader, Tag};

use crate::error::{PipelineError, Result};

// ── Header ────────────────────────────────────────────────────────────────────

pub fn encode_header(header: &ImageHeader) -> Result<Vec<u8>> {
    bincode::serde::encode_to_vec(header, bincode::config::standard())
        .map_err(|e| PipelineError::Serialization(e.to_string()))
}

pub fn decode_header(data: &[u8]) -> Result<ImageHeader> {
    let (header, _): (ImageHeader, usize) =
        bincode::serde::decode_from_slice(data, bincode::config::standard())
            .map_err(|e| PipelineError::Serialization(e.to_string()))?;
    header.validate()?;
    Ok(header)
}

/// Send `header` from the coordinator to every other rank, in rank order.
pub fn broadcast_header<T>(transport: &T, header: &ImageHeader) -> Result<()>
where
    T: Transport + ?Sized,
{
    let bytes = encode_header(header)?;
    for dest in 1..transport.size() {
        transport.send(dest, Tag::Header, bytes.clone())?;
    }
    debug!(ranks = transport.size() - 1, "header broadcast");
    Ok(())
}

/// Receive the header broadcast by rank 0.
pub fn receive_header<T>(transport: &T) -> Result<ImageHeader>
where
    T: Transport + ?Sized,
{
    let bytes = transport.recv(0, Tag::Header)?;
    decode_header(&bytes)
}

// ── Lines ─────────────────────────────────────────────────────────────────────

/// Send row `row` of `image` to `dest`.
pub fn send_line<T>(transport: &T, image: &Image, row: usize, dest: usize, tag: Tag) -> Result<()>
where
    T: Transport + ?Sized,
{
    let line = encode_line(image, row)?;
    transport.send(dest, tag, line)?;
    Ok(())
}

/// Receive one line from `source` into row `row` of `image`.
pub fn recv_line<T>(
    transport: &T,
    image: &mut Image,
    row: usize,
    source: usize,
    tag: Tag,
) -> Result<()>
where
    T: Transport + ?Sized,
{
    let line = transport.recv(source, tag)?;
    decode_line(image, row, &line)?;
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
