// In-memory raster model shared by the codec, the transport and the pipeline.
//
// Pixels live in one owned row-major buffer; a row is a computed slice of it.
// Slices handed to workers are ordinary `Image`s whose header height is the
// slice height.

use std::fmt;
use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::error::{HaloError, Result};

/// Channel capacity of a [`Pixel`]. Grayscale images use only the first slot.
pub const MAX_CHANNELS: usize = 3;

// ── Format ────────────────────────────────────────────────────────────────────

/// Pixel layout of an image. Mirrors the binary PNM magics `P5` / `P6`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ImageFormat {
    Grayscale,
    Color,
}

impl ImageFormat {
    /// Number of meaningful channels per pixel.
    pub fn channels(&self) -> u8 {
        match self {
            Self::Grayscale => 1,
            Self::Color => 3,
        }
    }

    /// The digit following `P` in a binary PNM header.
    pub fn magic(&self) -> u8 {
        match self {
            Self::Grayscale => b'5',
            Self::Color => b'6',
        }
    }

    pub fn from_magic(digit: u8) -> Option<Self> {
        match digit {
            b'5' => Some(Self::Grayscale),
            b'6' => Some(Self::Color),
            _ => None,
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Grayscale => write!(f, "grayscale"),
            Self::Color     => write!(f, "color"),
        }
    }
}

// ── Header ────────────────────────────────────────────────────────────────────

/// Image description broadcast to every worker before any row moves.
///
/// `channels` is redundant with `format` but travels on the wire so a worker
/// never has to re-derive it; [`ImageHeader::validate`] keeps the two in sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageHeader {
    pub format: ImageFormat,
    pub channels: u8,
    pub width: usize,
    pub height: usize,
    pub maxval: u8,
}

impl ImageHeader {
    pub fn new(format: ImageFormat, width: usize, height: usize, maxval: u8) -> Self {
        Self {
            format,
            channels: format.channels(),
            width,
            height,
            maxval,
        }
    }

    /// Same header with a different row count; used to size worker slices.
    pub fn with_height(&self, height: usize) -> Self {
        Self { height, ..*self }
    }

    /// Bytes in one serialized row (`width * channels`).
    pub fn line_len(&self) -> usize {
        self.width * self.channels as usize
    }

    pub fn pixel_count(&self) -> usize {
        self.width * self.height
    }

    pub fn validate(&self) -> Result<()> {
        if self.channels != self.format.channels() {
            return Err(HaloError::InvalidImage(format!(
                "{} image declares {} channels",
                self.format, self.channels
            )));
        }
        if self.width == 0 || self.height == 0 {
            return Err(HaloError::InvalidImage(format!(
                "empty image {}x{}",
                self.width, self.height
            )));
        }
        Ok(())
    }
}

// ── Pixel ─────────────────────────────────────────────────────────────────────

/// Up to three channel intensities. Only the first `channels` entries of the
/// owning image are meaningful; the rest stay zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Pixel(pub [u8; MAX_CHANNELS]);

impl Pixel {
    pub fn gray(v: u8) -> Self {
        Self([v, 0, 0])
    }

    pub fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self([r, g, b])
    }
}

// ── Image ─────────────────────────────────────────────────────────────────────

/// Owned pixel grid with its header.
#[derive(Clone, PartialEq, Eq)]
pub struct Image {
    header: ImageHeader,
    pixels: Vec<Pixel>,
}

impl Image {
    /// Zero-filled image for the given header.
    pub fn new(header: ImageHeader) -> Result<Self> {
        header.validate()?;
        Ok(Self {
            header,
            pixels: vec![Pixel::default(); header.pixel_count()],
        })
    }

    /// Build from interleaved bytes (`width * height * channels`, channel-minor).
    pub fn from_raw(header: ImageHeader, raw: &[u8]) -> Result<Self> {
        header.validate()?;
        let c = header.channels as usize;
        let expected = header.line_len() * header.height;
        if raw.len() != expected {
            return Err(HaloError::InvalidImage(format!(
                "expected {expected} bytes of pixel data, got {}",
                raw.len()
            )));
        }
        let pixels = raw
            .chunks_exact(c)
            .map(|chunk| {
                let mut px = Pixel::default();
                px.0[..c].copy_from_slice(chunk);
                px
            })
            .collect();
        Ok(Self { header, pixels })
    }

    /// Interleaved bytes, the inverse of [`Image::from_raw`].
    pub fn to_raw(&self) -> Vec<u8> {
        let c = self.channels();
        let mut out = Vec::with_capacity(self.pixels.len() * c);
        for px in &self.pixels {
            out.extend_from_slice(&px.0[..c]);
        }
        out
    }

    // ── Accessors ────────────────────────────────────────────────────────

    pub fn header(&self) -> &ImageHeader {
        &self.header
    }

    pub fn format(&self) -> ImageFormat {
        self.header.format
    }

    pub fn width(&self) -> usize {
        self.header.width
    }

    pub fn height(&self) -> usize {
        self.header.height
    }

    pub fn channels(&self) -> usize {
        self.header.channels as usize
    }

    pub fn maxval(&self) -> u8 {
        self.header.maxval
    }

    #[inline]
    pub fn row(&self, y: usize) -> &[Pixel] {
        let start = y * self.header.width;
        &self.pixels[start..start + self.header.width]
    }

    #[inline]
    pub fn row_mut(&mut self, y: usize) -> &mut [Pixel] {
        let start = y * self.header.width;
        let end = start + self.header.width;
        &mut self.pixels[start..end]
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> Pixel {
        self.pixels[y * self.header.width + x]
    }

    pub fn pixels(&self) -> &[Pixel] {
        &self.pixels
    }

    // ── Row blocks ───────────────────────────────────────────────────────

    /// Copy of the rows in `rows` as a standalone image.
    pub fn slice_rows(&self, rows: Range<usize>) -> Result<Image> {
        if rows.is_empty() || rows.end > self.height() {
            return Err(HaloError::InvalidImage(format!(
                "row range {rows:?} outside image of height {}",
                self.height()
            )));
        }
        let w = self.header.width;
        let pixels = self.pixels[rows.start * w..rows.end * w].to_vec();
        Ok(Image {
            header: self.header.with_height(rows.len()),
            pixels,
        })
    }

    /// Overwrite rows starting at `dst_row` with `src_rows` taken from `src`.
    pub fn copy_rows_from(
        &mut self,
        src: &Image,
        src_rows: Range<usize>,
        dst_row: usize,
    ) -> Result<()> {
        if src.width() != self.width() || src.channels() != self.channels() {
            return Err(HaloError::InvalidImage(format!(
                "row copy between {}x{}c and {}x{}c images",
                src.width(),
                src.channels(),
                self.width(),
                self.channels()
            )));
        }
        if src_rows.end > src.height() || dst_row + src_rows.len() > self.height() {
            return Err(HaloError::InvalidImage(format!(
                "row copy {src_rows:?} -> {dst_row} out of bounds"
            )));
        }
        let w = self.header.width;
        let n = src_rows.len() * w;
        self.pixels[dst_row * w..dst_row * w + n]
            .copy_from_slice(&src.pixels[src_rows.start * w..src_rows.end * w]);
        Ok(())
    }
}

impl fmt::Debug for Image {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Image")
            .field("format", &self.header.format)
            .field("width", &self.header.width)
            .field("height", &self.header.height)
            .field("maxval", &self.header.maxval)
            .finish_non_exhaustive()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn gray_header(w: usize, h: usize) -> ImageHeader {
        ImageHeader::new(ImageFormat::Grayscale, w, h, 255)
    }

    #[test]
    fn format_magic_round_trip() {
        for fmt in [ImageFormat::Grayscale, ImageFormat::Color] {
            assert_eq!(ImageFormat::from_magic(fmt.magic()), Some(fmt));
        }
        assert!(ImageFormat::from_magic(b'3').is_none());
    }

    #[test]
    fn header_rejects_inconsistent_channels() {
        let mut hdr = gray_header(4, 4);
        hdr.channels = 3;
        assert!(matches!(hdr.validate(), Err(HaloError::InvalidImage(_))));
        assert!(gray_header(0, 4).validate().is_err());
    }

    #[test]
    fn raw_bytes_are_channel_minor() {
        let hdr = ImageHeader::new(ImageFormat::Color, 2, 1, 255);
        let img = Image::from_raw(hdr, &[1, 2, 3, 4, 5, 6]).unwrap();
        assert_eq!(img.get(0, 0), Pixel::rgb(1, 2, 3));
        assert_eq!(img.get(1, 0), Pixel::rgb(4, 5, 6));
        assert_eq!(img.to_raw(), vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn raw_length_follows_line_len() {
        let hdr = ImageHeader::new(ImageFormat::Color, 3, 2, 255);
        assert_eq!(hdr.line_len(), 9);
        assert!(Image::from_raw(hdr, &[0; 18]).is_ok());
        assert!(matches!(
            Image::from_raw(hdr, &[0; 17]),
            Err(HaloError::InvalidImage(_))
        ));
    }

    #[test]
    fn slice_and_copy_rows() {
        let raw: Vec<u8> = (0..12).collect();
        let img = Image::from_raw(gray_header(3, 4), &raw).unwrap();

        let slice = img.slice_rows(1..3).unwrap();
        assert_eq!(slice.height(), 2);
        assert_eq!(slice.row(0)[0], Pixel::gray(3));
        assert_eq!(slice.row(1)[2], Pixel::gray(8));

        let mut target = Image::new(gray_header(3, 4)).unwrap();
        target.copy_rows_from(&slice, 0..2, 2).unwrap();
        assert_eq!(target.row(2)[0], Pixel::gray(3));
        assert_eq!(target.row(3)[2], Pixel::gray(8));
        assert_eq!(target.row(0)[0], Pixel::gray(0));

        assert!(img.slice_rows(3..5).is_err());
        assert!(target.copy_rows_from(&slice, 0..2, 3).is_err());
    }
}
