//! Planar geometry helpers shared by the classifier and the calculator.

use crate::types::Point;

/// Signed polygon area by the shoelace formula.
///
/// Positive for counter-clockwise vertex order in a y-up frame, which is
/// clockwise on screen. The closing edge from the last vertex back to the
/// first is implicit. Fewer than 3 vertices give 0.
#[must_use]
pub fn signed_area(vertices: &[Point]) -> f64 {
    if vertices.len() < 3 {
        return 0.0;
    }
    let twice: f64 = vertices
        .iter()
        .zip(vertices.iter().cycle().skip(1))
        .map(|(a, b)| a.x.mul_add(b.y, -(b.x * a.y)))
        .sum();
    twice / 2.0
}

/// Absolute polygon area by the shoelace formula.
#[must_use]
pub fn polygon_area(vertices: &[Point]) -> f64 {
    signed_area(vertices).abs()
}

/// Length of the closed loop through `vertices`.
///
/// Sums consecutive distances plus the closing edge. A single point has
/// zero perimeter; two points count the segment twice.
#[must_use]
pub fn polygon_perimeter(vertices: &[Point]) -> f64 {
    if vertices.len() < 2 {
        return 0.0;
    }
    vertices
        .iter()
        .zip(vertices.iter().cycle().skip(1))
        .map(|(a, b)| a.distance(*b))
        .sum()
}

/// Arithmetic mean of the points, or `None` for an empty slice.
#[must_use]
pub fn centroid(points: &[Point]) -> Option<Point> {
    if points.is_empty() {
        return None;
    }
    #[allow(clippy::cast_precision_loss)]
    let n = points.len() as f64;
    let (sx, sy) = points
        .iter()
        .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
    Some(Point::new(sx / n, sy / n))
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    /// Smallest x.
    pub min_x: f64,
    /// Smallest y.
    pub min_y: f64,
    /// Largest x.
    pub max_x: f64,
    /// Largest y.
    pub max_y: f64,
}

impl BoundingBox {
    /// Horizontal extent.
    #[must_use]
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    /// Vertical extent.
    #[must_use]
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }
}

/// Bounding box of the points, or `None` for an empty slice.
#[must_use]
pub fn bounding_box(points: &[Point]) -> Option<BoundingBox> {
    let first = points.first()?;
    let init = BoundingBox {
        min_x: first.x,
        min_y: first.y,
        max_x: first.x,
        max_y: first.y,
    };
    Some(points.iter().fold(init, |bb, p| BoundingBox {
        min_x: bb.min_x.min(p.x),
        min_y: bb.min_y.min(p.y),
        max_x: bb.max_x.max(p.x),
        max_y: bb.max_y.max(p.y),
    }))
}

/// Angle at `vertex` between the rays to `prev` and `next`, in degrees.
///
/// Returns a value in `[0, 180]`. The cosine is clamped before `acos` so
/// rounding never produces NaN for nearly straight corners. Returns `None`
/// when either ray has zero length.
#[must_use]
pub fn interior_angle(prev: Point, vertex: Point, next: Point) -> Option<f64> {
    let (ux, uy) = (prev.x - vertex.x, prev.y - vertex.y);
    let (vx, vy) = (next.x - vertex.x, next.y - vertex.y);
    let lengths = ux.hypot(uy) * vx.hypot(vy);
    if lengths == 0.0 {
        return None;
    }
    let cos = (ux.mul_add(vx, uy * vy) / lengths).clamp(-1.0, 1.0);
    Some(cos.acos().to_degrees())
}
