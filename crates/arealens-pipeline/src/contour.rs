//! Contour tracing: partition a binary edge map into connected regions.
//!
//! This module defines the [`ContourTracer`] trait for pluggable contour
//! tracing algorithms and the [`ContourTracerKind`] enum for selecting
//! which algorithm to use at runtime.
//!
//! # Strategy pattern
//!
//! Different tracing algorithms produce different point sequences from the
//! same edge map. The trait/enum design lets callers pick the algorithm
//! from configuration while keeping every implementation free of I/O.

use image::GrayImage;
use serde::{Deserialize, Serialize};

use crate::types::{Contour, Point};

/// Edge-map value marking an edge pixel.
const EDGE: u8 = 255;

/// Flood-fill neighbor offsets in push order: row by row from the row
/// above, left to right within each row.
///
/// The stack is LIFO, so the lower-right neighbor is popped first. Points
/// are recorded in visiting order, and the simplifier works on that order
/// as-is.
const NEIGHBORS: [(i64, i64); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

/// Selects which contour tracing algorithm to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContourTracerKind {
    /// Stack-based 8-connected flood fill in raster scan order.
    ///
    /// Each connected component of edge pixels becomes one contour, with
    /// points in visiting order.
    #[default]
    FloodFill,

    /// Suzuki-Abe border following via `imageproc::contours::find_contours`.
    ///
    /// Points come out in geometric order, but every region yields an
    /// outer border and, for thick outlines, a hole border as well.
    BorderFollowing,
}

/// Trait for contour tracing strategies.
///
/// Input: a binary edge map (255 = edge, anything else = background).
/// Output: one contour per traced region, in discovery order. Regions with
/// fewer than `min_points` points are dropped as noise.
pub trait ContourTracer {
    /// Trace contours in the given binary edge map.
    fn trace(&self, edges: &GrayImage, min_points: usize) -> Vec<Contour>;
}

impl ContourTracer for ContourTracerKind {
    fn trace(&self, edges: &GrayImage, min_points: usize) -> Vec<Contour> {
        match *self {
            Self::FloodFill => trace_flood_fill(edges, min_points),
            Self::BorderFollowing => trace_border_following(edges, min_points),
        }
    }
}

/// Explicit-stack flood fill over 8-connected edge pixels.
///
/// All eight neighbors of a visited pixel are pushed unconditionally;
/// bounds, edge value and the visited flag are checked when a position is
/// popped. Each pixel is visited at most once.
fn trace_flood_fill(edges: &GrayImage, min_points: usize) -> Vec<Contour> {
    let (w, h) = edges.dimensions();
    let (wi, hi) = (i64::from(w), i64::from(h));
    let mut visited = vec![false; w as usize * h as usize];
    let mut contours = Vec::new();
    let mut stack: Vec<(i64, i64)> = Vec::new();

    for y in 0..h {
        for x in 0..w {
            let start = y as usize * w as usize + x as usize;
            if visited[start] || edges.get_pixel(x, y).0[0] != EDGE {
                continue;
            }

            let mut points = Vec::new();
            stack.push((i64::from(x), i64::from(y)));

            while let Some((px, py)) = stack.pop() {
                if px < 0 || py < 0 || px >= wi || py >= hi {
                    continue;
                }
                // In bounds, so both fit in u32.
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                let (ux, uy) = (px as u32, py as u32);
                let idx = uy as usize * w as usize + ux as usize;
                if visited[idx] || edges.get_pixel(ux, uy).0[0] != EDGE {
                    continue;
                }

                visited[idx] = true;
                points.push(Point::new(f64::from(ux), f64::from(uy)));
                stack.extend(NEIGHBORS.iter().map(|&(dx, dy)| (px + dx, py + dy)));
            }

            if points.len() >= min_points {
                contours.push(Contour::new(points));
            }
        }
    }

    contours
}

/// Suzuki-Abe border following via `imageproc::contours::find_contours`.
///
/// Converts `imageproc` contour points (integer grid coordinates) into
/// floating-point [`Point`]s.
fn trace_border_following(edges: &GrayImage, min_points: usize) -> Vec<Contour> {
    // find_contours treats any non-zero pixel as foreground.
    let binary = GrayImage::from_fn(edges.width(), edges.height(), |x, y| {
        image::Luma([if edges.get_pixel(x, y).0[0] == EDGE { 1 } else { 0 }])
    });
    let contours: Vec<imageproc::contours::Contour<u32>> =
        imageproc::contours::find_contours(&binary);

    contours
        .into_iter()
        .filter(|c| c.points.len() >= min_points)
        .map(|c| {
            let points = c
                .points
                .into_iter()
                .map(|p| Point::new(f64::from(p.x), f64::from(p.y)))
                .collect();
            Contour::new(points)
        })
        .collect()
}
