//! Sobel gradient magnitude and binary edge thresholding.
//!
//! [`sobel_magnitude`] turns a smoothed luminance buffer into a gradient
//! strength map; [`threshold`] binarizes it into the edge map consumed by
//! contour tracing.

use image::{GrayImage, RgbaImage};

use crate::blur::gaussian_blur;
use crate::grayscale::to_grayscale;

/// Horizontal Sobel kernel, row-major.
const SOBEL_X: [[i32; 3]; 3] = [[-1, 0, 1], [-2, 0, 2], [-1, 0, 1]];
/// Vertical Sobel kernel, row-major.
const SOBEL_Y: [[i32; 3]; 3] = [[-1, -2, -1], [0, 0, 0], [1, 2, 1]];

/// Compute the Sobel gradient magnitude of a grayscale image.
///
/// Each interior pixel becomes `min(255, sqrt(gx² + gy²))`, truncated to
/// an integer. Border pixels stay 0, like the blur stage.
///
/// Because the blurred buffer has a black border, a bright image produces
/// a strong gradient ring one pixel inside its edge.
#[must_use = "returns the gradient magnitude image"]
pub fn sobel_magnitude(image: &GrayImage) -> GrayImage {
    let (w, h) = image.dimensions();
    let mut out = GrayImage::new(w, h);
    if w < 3 || h < 3 {
        return out;
    }

    for y in 1..h - 1 {
        for x in 1..w - 1 {
            let (mut gx, mut gy) = (0i32, 0i32);
            for ky in 0..3u32 {
                for kx in 0..3u32 {
                    let v = i32::from(image.get_pixel(x + kx - 1, y + ky - 1).0[0]);
                    gx += SOBEL_X[ky as usize][kx as usize] * v;
                    gy += SOBEL_Y[ky as usize][kx as usize] * v;
                }
            }
            let magnitude = f64::from(gx).hypot(f64::from(gy)).min(255.0);
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            out.put_pixel(x, y, image::Luma([magnitude as u8]));
        }
    }

    out
}

/// Binarize a gradient image.
///
/// Pixels strictly greater than `level` become 255 (edge); all others
/// become 0.
#[must_use = "returns the binary edge map"]
pub fn threshold(gradient: &GrayImage, level: u8) -> GrayImage {
    GrayImage::from_fn(gradient.width(), gradient.height(), |x, y| {
        let v = gradient.get_pixel(x, y).0[0];
        image::Luma([if v > level { 255 } else { 0 }])
    })
}

/// Run grayscale, blur, Sobel and thresholding in one call.
///
/// Exposes the binary edge map for visualization without tracing any
/// contours.
#[must_use = "returns the binary edge map"]
pub fn detect_edges(image: &RgbaImage, level: u8) -> GrayImage {
    let gray = to_grayscale(image);
    let blurred = gaussian_blur(&gray);
    threshold(&sobel_magnitude(&blurred), level)
}
