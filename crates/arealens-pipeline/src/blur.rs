//! Gaussian blur for noise reduction before edge detection.
//!
//! A fixed 3x3 binomial kernel smooths the luminance buffer, reducing
//! single-pixel noise that would otherwise produce spurious gradient
//! responses in the Sobel stage.

use image::GrayImage;

/// 3x3 binomial approximation of a Gaussian, row-major. Weights sum to 16.
const KERNEL: [[u32; 3]; 3] = [[1, 2, 1], [2, 4, 2], [1, 2, 1]];

/// Apply the 3x3 Gaussian kernel to a grayscale image.
///
/// Each interior pixel becomes the weighted neighborhood sum divided by
/// 16, truncated toward zero. Pixels on the one-pixel image border are
/// not computed and stay 0; images narrower or shorter than 3 pixels
/// come back entirely black.
///
/// This is step 2 in the pipeline, between grayscale conversion and the
/// Sobel gradient.
#[must_use = "returns the blurred image"]
pub fn gaussian_blur(image: &GrayImage) -> GrayImage {
    let (w, h) = image.dimensions();
    let mut out = GrayImage::new(w, h);
    if w < 3 || h < 3 {
        return out;
    }

    for y in 1..h - 1 {
        for x in 1..w - 1 {
            let mut sum = 0u32;
            for (ky, row) in KERNEL.iter().enumerate() {
                for (kx, weight) in row.iter().enumerate() {
                    // ky, kx are 0..3 so the offsets stay inside the image.
                    #[allow(clippy::cast_possible_truncation)]
                    let (sx, sy) = (x + kx as u32 - 1, y + ky as u32 - 1);
                    sum += weight * u32::from(image.get_pixel(sx, sy).0[0]);
                }
            }
            // sum <= 16 * 255, so sum / 16 fits in a u8.
            #[allow(clippy::cast_possible_truncation)]
            out.put_pixel(x, y, image::Luma([(sum / 16) as u8]));
        }
    }

    out
}
