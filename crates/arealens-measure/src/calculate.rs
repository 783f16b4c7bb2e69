//! Area and perimeter of a single shape, plus validation.
//!
//! Pixel-space formulas per variant:
//!
//! | Shape     | Area            | Perimeter             |
//! |-----------|-----------------|-----------------------|
//! | Rectangle | `\|w * h\|`     | `2 * (\|w\| + \|h\|)` |
//! | Circle    | `pi * r^2`      | `2 * pi * r`          |
//! | Triangle  | shoelace        | closed vertex loop    |
//! | Polygon   | shoelace        | closed vertex loop    |
//!
//! Calibrated values divide lengths by `scale` and areas by `scale^2`.

use std::f64::consts::PI;

use arealens_pipeline::geometry::{polygon_area, polygon_perimeter};
use arealens_pipeline::{Shape, ShapeRecord};

use crate::MeasureError;

/// Whether `scale` converts pixels to real units.
///
/// Zero, negative, NaN and infinite scales are all uncalibrated.
#[must_use]
pub fn is_calibrated(scale: f64) -> bool {
    scale.is_finite() && scale > 0.0
}

/// Area in square pixels.
#[must_use]
pub fn pixel_area(shape: &Shape) -> f64 {
    match shape {
        Shape::Rectangle { width, height, .. } => (width * height).abs(),
        Shape::Circle { radius, .. } => PI * radius * radius,
        Shape::Triangle { vertices } => polygon_area(vertices),
        Shape::Polygon { vertices } => polygon_area(vertices),
    }
}

/// Perimeter in pixels.
#[must_use]
pub fn pixel_perimeter(shape: &Shape) -> f64 {
    match shape {
        Shape::Rectangle { width, height, .. } => 2.0 * (width.abs() + height.abs()),
        Shape::Circle { radius, .. } => 2.0 * PI * radius,
        Shape::Triangle { vertices } => polygon_perimeter(vertices),
        Shape::Polygon { vertices } => polygon_perimeter(vertices),
    }
}

/// Area in square units of `1 / scale`.
///
/// Returns [`pixel_area`] unchanged when `scale` is uncalibrated. Use
/// [`validate_scale`] first to tell the two cases apart.
#[must_use]
pub fn area(shape: &Shape, scale: f64) -> f64 {
    let pixels = pixel_area(shape);
    if is_calibrated(scale) {
        pixels / (scale * scale)
    } else {
        pixels
    }
}

/// Perimeter in units of `1 / scale`.
///
/// Returns [`pixel_perimeter`] unchanged when `scale` is uncalibrated.
#[must_use]
pub fn perimeter(shape: &Shape, scale: f64) -> f64 {
    let pixels = pixel_perimeter(shape);
    if is_calibrated(scale) { pixels / scale } else { pixels }
}

/// Area of a detected shape.
///
/// Measures the classified geometry, not the raw outline: a detected
/// rectangle uses its bounding box.
#[must_use]
pub fn record_area(record: &ShapeRecord, scale: f64) -> f64 {
    area(&record.shape, scale)
}

/// Perimeter of a detected shape.
#[must_use]
pub fn record_perimeter(record: &ShapeRecord, scale: f64) -> f64 {
    perimeter(&record.shape, scale)
}

// ───────────────────────── Validation ─────────────────────────────

/// Check that a shape is geometrically meaningful.
///
/// Triangles always carry three vertices, so they pass regardless of
/// their area.
///
/// # Errors
///
/// - [`MeasureError::NonPositiveDimensions`] for a rectangle without a
///   positive width and height.
/// - [`MeasureError::NonPositiveRadius`] for a circle without a positive
///   radius.
/// - [`MeasureError::TooFewVertices`] for a polygon with fewer than three
///   vertices.
pub fn validate_shape(shape: &Shape) -> Result<(), MeasureError> {
    match shape {
        Shape::Rectangle { width, height, .. } => {
            if *width > 0.0 && *height > 0.0 {
                Ok(())
            } else {
                Err(MeasureError::NonPositiveDimensions)
            }
        }
        Shape::Circle { radius, .. } => {
            if *radius > 0.0 {
                Ok(())
            } else {
                Err(MeasureError::NonPositiveRadius)
            }
        }
        Shape::Triangle { .. } => Ok(()),
        Shape::Polygon { vertices } => {
            if vertices.len() >= 3 {
                Ok(())
            } else {
                Err(MeasureError::TooFewVertices {
                    count: vertices.len(),
                })
            }
        }
    }
}

/// Check that `scale` is usable for calibrated measurement.
///
/// # Errors
///
/// Returns [`MeasureError::InvalidScale`] unless [`is_calibrated`] holds.
pub fn validate_scale(scale: f64) -> Result<(), MeasureError> {
    if is_calibrated(scale) {
        Ok(())
    } else {
        Err(MeasureError::InvalidScale(scale))
    }
}
