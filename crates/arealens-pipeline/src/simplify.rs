//! Contour simplification using the Ramer-Douglas-Peucker algorithm.
//!
//! Reduces a traced contour to the handful of vertices the classifier
//! reasons about: points within the tolerance of the chord between their
//! neighbors are dropped.
//!
//! This is step 6 in the pipeline, between contour tracing and shape
//! classification.

use crate::types::{Contour, Point};

/// Simplify a single contour using the Ramer-Douglas-Peucker algorithm.
///
/// The chord runs from the first to the last point of the sequence; the
/// contour is not treated as closed. Points whose perpendicular distance
/// to the chord does not exceed `tolerance` are removed. A tolerance of
/// 0.0 keeps every point that is off the chord.
///
/// Contours with 2 points or fewer are returned unchanged. A sequence
/// whose first and last points coincide has no chord to measure against,
/// so it collapses to those two points.
#[must_use = "returns the simplified contour"]
pub fn simplify(contour: &Contour, tolerance: f64) -> Contour {
    let points = contour.points();
    if points.len() <= 2 {
        return contour.clone();
    }

    let last = points.len() - 1;
    let mut kept = vec![false; points.len()];
    kept[0] = true;
    kept[last] = true;

    mark_farthest(points, 0, last, tolerance, &mut kept);

    let simplified = points
        .iter()
        .zip(&kept)
        .filter_map(|(&p, &k)| k.then_some(p))
        .collect();

    Contour::new(simplified)
}

/// Simplify every contour independently.
#[must_use = "returns the simplified contours"]
pub fn simplify_all(contours: &[Contour], tolerance: f64) -> Vec<Contour> {
    contours.iter().map(|c| simplify(c, tolerance)).collect()
}

/// Recursive step: keep the point farthest from the `start..end` chord if
/// it lies beyond `tolerance`, then recurse into both halves.
///
/// Ties keep the earliest point. The shared split point is marked once,
/// which is the same as concatenating both halves and dropping the
/// duplicate.
fn mark_farthest(points: &[Point], start: usize, end: usize, tolerance: f64, kept: &mut [bool]) {
    if end <= start + 1 {
        return;
    }

    let (a, b) = (points[start], points[end]);
    let (split, max_dist) = ((start + 1)..end)
        .map(|i| (i, line_distance(points[i], a, b)))
        .fold((start, 0.0), |best, cur| if cur.1 > best.1 { cur } else { best });

    if max_dist > tolerance {
        kept[split] = true;
        mark_farthest(points, start, split, tolerance, kept);
        mark_farthest(points, split, end, tolerance, kept);
    }
}

/// Distance from `p` to the infinite line through `a` and `b`.
///
/// Uses the implicit form `Ax + By + C = 0` with `A = b.y - a.y`,
/// `B = a.x - b.x`, `C = b.x*a.y - a.x*b.y`. When `a` and `b` coincide the
/// line is undefined and the distance is 0, so nothing is split off.
fn line_distance(p: Point, a: Point, b: Point) -> f64 {
    let coef_a = b.y - a.y;
    let coef_b = a.x - b.x;
    let coef_c = b.x.mul_add(a.y, -(a.x * b.y));

    let norm = coef_a.hypot(coef_b);
    if norm == 0.0 {
        return 0.0;
    }

    coef_a.mul_add(p.x, coef_b.mul_add(p.y, coef_c)).abs() / norm
}
