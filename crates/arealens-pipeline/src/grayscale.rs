//! Bitmap intake and grayscale conversion.
//!
//! Accepts either encoded image bytes (PNG, JPEG, BMP, WebP) or a raw
//! row-major pixel buffer, and produces the single-channel luminance
//! buffer the rest of the pipeline works on.
//!
//! This is the first step in the pipeline: pixels in, `GrayImage` out.

use image::{GrayImage, RgbaImage};

use crate::types::PipelineError;

/// Decode encoded image bytes into an RGBA bitmap.
///
/// Supports whatever the `image` crate was built to decode.
///
/// # Errors
///
/// Returns [`PipelineError::EmptyInput`] if `bytes` is empty.
/// Returns [`PipelineError::ImageDecode`] if the image format is
/// unrecognized or the data is corrupt.
#[must_use = "returns the decoded RGBA image"]
pub fn decode(bytes: &[u8]) -> Result<RgbaImage, PipelineError> {
    if bytes.is_empty() {
        return Err(PipelineError::EmptyInput);
    }

    let img = image::load_from_memory(bytes)?;
    Ok(img.to_rgba8())
}

/// Wrap a raw RGBA buffer (4 bytes per pixel, row-major) as an image.
///
/// # Errors
///
/// Returns [`PipelineError::EmptyInput`] if either dimension is zero, and
/// [`PipelineError::InvalidDimensions`] if `data.len()` is not exactly
/// `width * height * 4`.
pub fn rgba_from_raw(width: u32, height: u32, data: Vec<u8>) -> Result<RgbaImage, PipelineError> {
    check_raw_len(width, height, 4, data.len())?;
    let actual = data.len();
    RgbaImage::from_raw(width, height, data).ok_or(PipelineError::InvalidDimensions {
        width,
        height,
        expected: expected_len(width, height, 4),
        actual,
    })
}

/// Wrap a raw single-channel buffer (1 byte per pixel, row-major) as an
/// image.
///
/// # Errors
///
/// Same conditions as [`rgba_from_raw`] with one byte per pixel.
pub fn luma_from_raw(width: u32, height: u32, data: Vec<u8>) -> Result<GrayImage, PipelineError> {
    check_raw_len(width, height, 1, data.len())?;
    let actual = data.len();
    GrayImage::from_raw(width, height, data).ok_or(PipelineError::InvalidDimensions {
        width,
        height,
        expected: expected_len(width, height, 1),
        actual,
    })
}

fn expected_len(width: u32, height: u32, channels: usize) -> usize {
    width as usize * height as usize * channels
}

fn check_raw_len(
    width: u32,
    height: u32,
    channels: usize,
    actual: usize,
) -> Result<(), PipelineError> {
    if width == 0 || height == 0 {
        return Err(PipelineError::EmptyInput);
    }
    let expected = expected_len(width, height, channels);
    if actual != expected {
        return Err(PipelineError::InvalidDimensions {
            width,
            height,
            expected,
            actual,
        });
    }
    Ok(())
}

/// Convert an RGBA bitmap to luminance.
///
/// Each output value is `round(0.299*R + 0.587*G + 0.114*B)`. Alpha is
/// ignored, so fully transparent pixels contribute their color channels
/// as-is.
#[must_use = "returns the grayscale image"]
pub fn to_grayscale(image: &RgbaImage) -> GrayImage {
    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        let [r, g, b, _] = image.get_pixel(x, y).0;
        image::Luma([luminance(r, g, b)])
    })
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn luminance(r: u8, g: u8, b: u8) -> u8 {
    let l = 0.114f64.mul_add(
        f64::from(b),
        0.299f64.mul_add(f64::from(r), 0.587 * f64::from(g)),
    );
    l.round().clamp(0.0, 255.0) as u8
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_returns_error() {
        let result = decode(&[]);
        assert!(matches!(result, Err(PipelineError::EmptyInput)));
    }

    #[test]
    fn corrupt_bytes_returns_image_decode_error() {
        let result = decode(&[0xFF, 0xFE, 0x00, 0x01]);
        assert!(matches!(result, Err(PipelineError::ImageDecode(_))));
    }

    #[test]
    fn valid_png_decodes_with_dimensions() {
        let img = RgbaImage::from_pixel(17, 31, image::Rgba([128, 64, 32, 255]));
        let decoded = decode(&encode_png(&img)).unwrap();
        assert_eq!(decoded.dimensions(), (17, 31));
        assert_eq!(decoded.get_pixel(3, 4).0, [128, 64, 32, 255]);
    }

    #[test]
    fn raw_rgba_length_mismatch_is_rejected() {
        let result = rgba_from_raw(2, 2, vec![0; 15]);
        assert!(matches!(
            result,
            Err(PipelineError::InvalidDimensions {
                expected: 16,
                actual: 15,
                ..
            })
        ));
    }

    #[test]
    fn raw_zero_dimension_is_empty_input() {
        assert!(matches!(
            rgba_from_raw(0, 5, vec![]),
            Err(PipelineError::EmptyInput)
        ));
        assert!(matches!(
            luma_from_raw(5, 0, vec![]),
            Err(PipelineError::EmptyInput)
        ));
    }

    #[test]
    fn raw_luma_wraps_buffer() {
        let gray = luma_from_raw(3, 2, vec![1, 2, 3, 4, 5, 6]).unwrap();
        assert_eq!(gray.get_pixel(2, 1).0[0], 6);
        assert_eq!(gray.get_pixel(0, 1).0[0], 4);
    }

    #[test]
    fn luminance_weights_match_rec601() {
        assert_eq!(luminance(255, 255, 255), 255);
        assert_eq!(luminance(0, 0, 0), 0);
        // 0.299 * 255 = 76.245
        assert_eq!(luminance(255, 0, 0), 76);
        // 0.587 * 255 = 149.685
        assert_eq!(luminance(0, 255, 0), 150);
        // 0.114 * 255 = 29.07
        assert_eq!(luminance(0, 0, 255), 29);
        // 0.299*100 + 0.587*150 + 0.114*200 = 140.75
        assert_eq!(luminance(100, 150, 200), 141);
    }

    #[test]
    fn monochrome_input_is_unchanged() {
        // One pixel per level; the weights sum to 1 so R=G=B=v maps to v.
        let img = RgbaImage::from_fn(256, 1, |x, _| {
            #[allow(clippy::cast_possible_truncation)]
            let v = x as u8;
            image::Rgba([v, v, v, 255])
        });
        let gray = to_grayscale(&img);
        for (x, pixel) in gray.enumerate_pixels().map(|(x, _, p)| (x, p)) {
            assert_eq!(u32::from(pixel.0[0]), x, "level {x}");
        }
    }

    #[test]
    fn alpha_is_ignored() {
        let img = RgbaImage::from_pixel(1, 1, image::Rgba([255, 255, 255, 0]));
        assert_eq!(to_grayscale(&img).get_pixel(0, 0).0[0], 255);
    }

    #[test]
    fn grayscale_preserves_dimensions() {
        let img = RgbaImage::new(7, 3);
        let gray = to_grayscale(&img);
        assert_eq!(gray.dimensions(), (7, 3));
    }

    /// Helper: encode an RGBA image as a PNG byte buffer.
    fn encode_png(img: &RgbaImage) -> Vec<u8> {
        let mut buf = Vec::new();
        let encoder = image::codecs::png::PngEncoder::new(&mut buf);
        image::ImageEncoder::write_image(
            encoder,
            img.as_raw(),
            img.width(),
            img.height(),
            image::ExtendedColorType::Rgba8,
        )
        .unwrap();
        buf
    }
}
