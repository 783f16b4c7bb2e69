//! Shape classification of simplified contours.
//!
//! Tests run in a fixed order and the first match wins: rectangle, circle,
//! triangle, then the generic polygon fallback. The vertex-count gates
//! make the branches mostly exclusive, but the order still matters for a
//! 4-point outline, which becomes a triangle when its corners are not
//! close enough to square.
//!
//! This is step 7 in the pipeline, the last one.

use crate::geometry::{bounding_box, centroid, interior_angle};
use crate::types::{Contour, Point, Shape, ShapeRecord};

/// Largest deviation from 90° a rectangle corner may have.
pub const RIGHT_ANGLE_TOLERANCE_DEG: f64 = 15.0;

/// Minimum simplified point count for the circle test.
pub const MIN_CIRCLE_POINTS: usize = 8;

/// A contour is round when the standard deviation of its radii is below
/// this fraction of the mean radius.
pub const CIRCULARITY_TOLERANCE: f64 = 0.15;

/// Classify one simplified contour.
///
/// Returns `None` for contours with fewer than 3 points.
#[must_use]
pub fn classify(contour: &Contour) -> Option<Shape> {
    let points = contour.points();
    if points.len() < 3 {
        return None;
    }

    let shape = as_rectangle(points)
        .or_else(|| as_circle(points))
        .or_else(|| as_triangle(points))
        .unwrap_or_else(|| Shape::Polygon {
            vertices: points.to_vec(),
        });
    Some(shape)
}

/// Classify every contour, dropping the unclassifiable ones.
///
/// Keeps the input order, which is raster discovery order when fed from
/// the tracer.
#[must_use]
pub fn classify_all(contours: &[Contour]) -> Vec<ShapeRecord> {
    contours
        .iter()
        .filter_map(|outline| {
            classify(outline).map(|shape| ShapeRecord {
                shape,
                outline: outline.clone(),
            })
        })
        .collect()
}

/// Four (or five, closing) points whose corners are all near-square.
///
/// A fifth point is ignored rather than checked against the first.
fn as_rectangle(points: &[Point]) -> Option<Shape> {
    if !matches!(points.len(), 4 | 5) {
        return None;
    }
    let corners = &points[..4];

    for i in 0..4 {
        let angle = interior_angle(corners[i], corners[(i + 1) % 4], corners[(i + 2) % 4])?;
        if (angle - 90.0).abs() >= RIGHT_ANGLE_TOLERANCE_DEG {
            return None;
        }
    }

    let bb = bounding_box(corners)?;
    Some(Shape::Rectangle {
        x: bb.min_x,
        y: bb.min_y,
        width: bb.width(),
        height: bb.height(),
    })
}

fn as_circle(points: &[Point]) -> Option<Shape> {
    if points.len() < MIN_CIRCLE_POINTS {
        return None;
    }
    let center = centroid(points)?;

    #[allow(clippy::cast_precision_loss)]
    let n = points.len() as f64;
    let radii: Vec<f64> = points.iter().map(|p| p.distance(center)).collect();
    let mean = radii.iter().sum::<f64>() / n;
    let variance = radii.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;

    (variance.sqrt() < CIRCULARITY_TOLERANCE * mean).then_some(Shape::Circle {
        center,
        radius: mean,
    })
}

/// Any 3 or 4 point outline that got this far. Only the first three
/// points are used.
fn as_triangle(points: &[Point]) -> Option<Shape> {
    match points {
        [a, b, c] | [a, b, c, _] => Some(Shape::Triangle {
            vertices: [*a, *b, *c],
        }),
        _ => None,
    }
}
