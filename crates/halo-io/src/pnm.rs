//! Binary PNM codec (`P5` grayscale, `P6` colour, 8-bit samples).
//!
//! Decoding accepts any whitespace between header tokens and `#` comments
//! running to end of line. Exactly one whitespace byte separates `maxval`
//! from the pixel data. Trailing bytes after the last pixel are ignored.
//!
//! Encoding always writes the canonical header `P{5|6}\n{w} {h}\n{maxval}\n`,
//! so decode → encode is byte-identical for files that already use it.

use halo_types::{Image, ImageFormat, ImageHeader};

use crate::error::{ImageIoError, Result};

// ── Decode ────────────────────────────────────────────────────────────────────

/// Parse a binary PNM file held in memory.
pub fn decode(data: &[u8]) -> Result<Image> {
    let mut reader = HeaderReader { data, pos: 0 };
    let format = reader.read_magic()?;
    let width = reader.read_number("width")?;
    let height = reader.read_number("height")?;
    let maxval = reader.read_number("maxval")?;

    if maxval == 0 {
        return Err(ImageIoError::Malformed("maxval must be positive".into()));
    }
    let maxval = u8::try_from(maxval).map_err(|_| {
        ImageIoError::Unsupported(format!("maxval {maxval} needs 16-bit samples"))
    })?;

    reader.expect_single_whitespace()?;

    let header = ImageHeader::new(format, width, height, maxval);
    header.validate()?;

    let expected = width
        .checked_mul(height)
        .and_then(|n| n.checked_mul(format.channels() as usize))
        .ok_or_else(|| ImageIoError::Malformed(format!("{width}x{height} overflows")))?;
    let body = &data[reader.pos..];
    if body.len() < expected {
        return Err(ImageIoError::Truncated {
            expected,
            actual: body.len(),
        });
    }

    Ok(Image::from_raw(header, &body[..expected])?)
}

/// Cursor over the ASCII header.
struct HeaderReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl HeaderReader<'_> {
    fn read_magic(&mut self) -> Result<ImageFormat> {
        let digit = match self.data {
            [b'P', digit, ..] => *digit,
            _ => return Err(ImageIoError::Malformed("missing 'P' magic".into())),
        };
        self.pos = 2;
        ImageFormat::from_magic(digit).ok_or_else(|| match digit {
            b'1'..=b'4' | b'7' => ImageIoError::Unsupported(format!(
                "P{} (only binary P5/P6 are supported)",
                digit as char
            )),
            _ => ImageIoError::Malformed("bad magic number".into()),
        })
    }

    fn skip_whitespace_and_comments(&mut self) {
        while let Some(&b) = self.data.get(self.pos) {
            if b == b'#' {
                while let Some(&c) = self.data.get(self.pos) {
                    self.pos += 1;
                    if c == b'\n' {
                        break;
                    }
                }
            } else if b.is_ascii_whitespace() {
                self.pos += 1;
            } else {
                break;
            }
        }
    }

    fn read_number(&mut self, field: &str) -> Result<usize> {
        self.skip_whitespace_and_comments();
        let start = self.pos;
        let mut value: usize = 0;
        while let Some(&b) = self.data.get(self.pos) {
            if !b.is_ascii_digit() {
                break;
            }
            value = value
                .checked_mul(10)
                .and_then(|v| v.checked_add((b - b'0') as usize))
                .ok_or_else(|| ImageIoError::Malformed(format!("{field} overflows")))?;
            self.pos += 1;
        }
        if self.pos == start {
            return Err(ImageIoError::Malformed(format!("expected {field}")));
        }
        Ok(value)
    }

    fn expect_single_whitespace(&mut self) -> Result<()> {
        match self.data.get(self.pos) {
            Some(b) if b.is_ascii_whitespace() => {
                self.pos += 1;
                Ok(())
            }
            Some(_) => Err(ImageIoError::Malformed(
                "expected whitespace after maxval".into(),
            )),
            None => Err(ImageIoError::Malformed("header ends after maxval".into())),
        }
    }
}

// ── Encode ────────────────────────────────────────────────────────────────────

/// Serialize an image as binary PNM with the canonical header.
pub fn encode(image: &Image) -> Vec<u8> {
    let header = format!(
        "P{}\n{} {}\n{}\n",
        image.format().magic() as char,
        image.width(),
        image.height(),
        image.maxval()
    );
    let mut out = header.into_bytes();
    out.extend_from_slice(&image.to_raw());
    out
}

// ── Tests ─────────────────────────────────────────────────────────────────────
