// halo-net::codec — line buffer codec. One image row travels as a flat byte
// buffer of `width * channels` bytes.
//
// Wire format: pixel-major, channel-minor
//   [p0.c0 .. p0.c(n-1)][p1.c0 .. p1.c(n-1)] ...
// No framing: both ends already agree on width and channels through the
// header broadcast, and the receiver checks the length against its own.

use halo_types::Image;

use crate::error::{NetError, Result};

/// Serialize row `row` of `image` into a fresh line buffer.
pub fn encode_line(image: &Image, row: usize) -> Result<Vec<u8>> {
    check_row(image, row)?;
    let c = image.channels();
    let mut buf = Vec::with_capacity(image.header().line_len());
    for px in image.row(row) {
        buf.extend_from_slice(&px.0[..c]);
    }
    Ok(buf)
}

/// Overwrite row `row` of `image` with the contents of `line`.
pub fn decode_line(image: &mut Image, row: usize, line: &[u8]) -> Result<()> {
    check_row(image, row)?;
    let c = image.channels();
    let expected = image.header().line_len();
    if line.len() != expected {
        return Err(NetError::LengthMismatch {
            expected,
            actual: line.len(),
        });
    }
    for (px, bytes) in image.row_mut(row).iter_mut().zip(line.chunks_exact(c)) {
        px.0[..c].copy_from_slice(bytes);
    }
    Ok(())
}

fn check_row(image: &Image, row: usize) -> Result<()> {
    if row >= image.height() {
        return Err(NetError::RowOutOfRange {
            row,
            height: image.height(),
        });
    }
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use halo_types::{ImageFormat, ImageHeader, Pixel};

    fn color(w: usize, h: usize) -> Image {
        let hdr = ImageHeader::new(ImageFormat::Color, w, h, 255);
        let raw: Vec<u8> = (0..(w * h * 3) as u32).map(|v| v as u8).collect();
        Image::from_raw(hdr, &raw).unwrap()
    }

    #[test]
    fn color_line_layout() {
        let img = color(2, 2);
        assert_eq!(encode_line(&img, 1).unwrap(), vec![6, 7, 8, 9, 10, 11]);
    }

    #[test]
    fn decode_touches_only_target_row() {
        let mut img = color(2, 3);
        let before = img.clone();
        decode_line(&mut img, 1, &[0xAA; 6]).unwrap();
        assert_eq!(img.row(1), &[Pixel::rgb(0xAA, 0xAA, 0xAA); 2]);
        assert_eq!(img.row(0), before.row(0));
        assert_eq!(img.row(2), before.row(2));
    }

    #[test]
    fn grayscale_line_is_one_byte_per_pixel() {
        let hdr = ImageHeader::new(ImageFormat::Grayscale, 4, 1, 255);
        let img = Image::from_raw(hdr, &[9, 8, 7, 6]).unwrap();
        assert_eq!(encode_line(&img, 0).unwrap(), vec![9, 8, 7, 6]);
    }

    #[test]
    fn wrong_length_is_rejected() {
        let mut img = color(2, 2);
        let err = decode_line(&mut img, 0, &[0; 5]).unwrap_err();
        assert!(matches!(err, NetError::LengthMismatch { expected: 6, actual: 5 }));
    }

    #[test]
    fn row_out_of_range() {
        let img = color(2, 2);
        assert!(matches!(
            encode_line(&img, 2),
            Err(NetError::RowOutOfRange { row: 2, height: 2 })
        ));
    }
}
