//! 3×3 convolution over the interior of an image or slice.
//!
//! Only rows `1..h-1` and columns `1..w-1` are computed; the border of the
//! input is copied through unchanged. For a worker slice the first and last
//! rows are ghost rows, so after a pass they hold stale input values until
//! the next halo exchange refreshes them.
//!
//! Each output sample is the `f32` weighted sum in row-major kernel order,
//! rounded to nearest and narrowed with a saturating cast. No other clamping
//! is applied.

use halo_types::{Image, Kernel, Pixel, MAX_CHANNELS};

/// Apply `kernel` to `input`, returning a new image of the same dimensions.
pub fn apply_stencil(input: &Image, kernel: &Kernel) -> Image {
    let mut output = input.clone();
    let (w, h) = (input.width(), input.height());
    if w < 3 || h < 3 {
        return output;
    }

    let channels = input.channels();
    for y in 1..h - 1 {
        let rows = [input.row(y - 1), input.row(y), input.row(y + 1)];
        let out_row = output.row_mut(y);
        for x in 1..w - 1 {
            out_row[x] = convolve_pixel(&rows, x, kernel, channels);
        }
    }
    output
}

#[inline]
fn convolve_pixel(rows: &[&[Pixel]; 3], x: usize, kernel: &Kernel, channels: usize) -> Pixel {
    let mut acc = [0.0f32; MAX_CHANNELS];
    for (row, weights) in rows.iter().zip(&kernel.weights) {
        for (px, &weight) in row[x - 1..=x + 1].iter().zip(weights) {
            for (sum, &sample) in acc.iter_mut().zip(&px.0).take(channels) {
                *sum += weight * sample as f32;
            }
        }
    }

    let mut out = Pixel::default();
    for (dst, sum) in out.0.iter_mut().zip(acc).take(channels) {
        *dst = sum.round() as u8;
    }
    out
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use halo_types::{FilterKind, ImageFormat, ImageHeader};

    fn gray(w: usize, h: usize, data: &[u8]) -> Image {
        Image::from_raw(ImageHeader::new(ImageFormat::Grayscale, w, h, 255), data).unwrap()
    }

    #[test]
    fn uniform_field_is_fixed_point_of_smooth() {
        let img = gray(5, 5, &[100; 25]);
        let out = apply_stencil(&img, FilterKind::Smooth.kernel());
        assert!(out.pixels().iter().all(|px| *px == Pixel::gray(100)));
    }

    #[test]
    fn three_by_three_changes_only_centre() {
        let data = [10, 20, 30, 40, 50, 60, 70, 80, 90];
        let img = gray(3, 3, &data);
        let out = apply_stencil(&img, FilterKind::Emboss.kernel());
        // emboss: top-centre minus bottom-centre, saturated at 0.
        assert_eq!(out.get(1, 1), Pixel::gray(0));
        for (i, (a, b)) in img.pixels().iter().zip(out.pixels()).enumerate() {
            if i != 4 {
                assert_eq!(a, b, "border pixel {i} changed");
            }
        }
    }

    #[test]
    fn emboss_positive_gradient() {
        // Bright top row, dark bottom row: centre = 200 - 50.
        let img = gray(3, 3, &[200, 200, 200, 0, 0, 0, 50, 50, 50]);
        let out = apply_stencil(&img, FilterKind::Emboss.kernel());
        assert_eq!(out.get(1, 1), Pixel::gray(150));
    }

    #[test]
    fn mean_kernel_saturates_high() {
        let img = gray(3, 3, &[0, 0, 0, 0, 255, 0, 0, 0, 0]);
        let out = apply_stencil(&img, FilterKind::Mean.kernel());
        assert_eq!(out.get(1, 1), Pixel::gray(255));
    }

    #[test]
    fn blur_weights_centre() {
        let img = gray(3, 3, &[0, 0, 0, 0, 160, 0, 0, 0, 0]);
        let out = apply_stencil(&img, FilterKind::Blur.kernel());
        assert_eq!(out.get(1, 1), Pixel::gray(40));
    }

    #[test]
    fn color_channels_are_independent() {
        let hdr = ImageHeader::new(ImageFormat::Color, 3, 3, 255);
        let mut raw = Vec::new();
        for _ in 0..9 {
            raw.extend([90, 180, 27]);
        }
        let img = Image::from_raw(hdr, &raw).unwrap();
        let out = apply_stencil(&img, FilterKind::Smooth.kernel());
        assert_eq!(out.get(1, 1), Pixel::rgb(90, 180, 27));
    }

    #[test]
    fn thin_images_pass_through() {
        let img = gray(2, 4, &[1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(apply_stencil(&img, FilterKind::Sharpen.kernel()), img);
    }

    #[test]
    fn input_is_not_mutated() {
        let img = gray(4, 4, &(0..16).map(|v| v * 10).collect::<Vec<u8>>());
        let before = img.clone();
        let _ = apply_stencil(&img, FilterKind::Sharpen.kernel());
        assert_eq!(img, before);
    }
}
