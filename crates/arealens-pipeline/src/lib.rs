//! arealens-pipeline: Pure shape detection pipeline (sans-IO).
//!
//! Finds geometric shapes in a raster image through:
//! grayscale -> blur -> Sobel gradient -> threshold -> contour tracing ->
//! simplification -> classification.
//!
//! This crate has **no I/O dependencies** -- it operates on in-memory
//! bitmaps and returns structured data. Measurement lives in
//! `arealens-measure`, serialization in `arealens-export`.

pub mod blur;
pub mod classify;
pub mod contour;
pub mod diagnostics;
pub mod edge;
pub mod geometry;
pub mod grayscale;
pub mod pipeline;
pub mod simplify;
pub mod types;

pub use contour::{ContourTracer, ContourTracerKind};
pub use edge::detect_edges;
pub use grayscale::{decode, luma_from_raw, rgba_from_raw, to_grayscale};
pub use pipeline::Pipeline;
pub use types::{
    Contour, DetectionConfig, DetectionResult, Dimensions, GrayImage, PipelineError, Point,
    RgbaImage, Shape, ShapeKind, ShapeRecord, StagedResult,
};

/// Detect shapes in an RGBA bitmap.
///
/// Records come back in discovery order: the raster position of each
/// region's first pixel, not size or spatial grouping. Images with no
/// edges, noise-only regions and unclassifiable outlines all produce an
/// empty or shorter list, never an error.
///
/// # Pipeline steps
///
/// 1. Grayscale conversion (BT.601 luma)
/// 2. 3x3 Gaussian blur
/// 3. Sobel gradient magnitude
/// 4. Threshold into a binary edge map
/// 5. Contour tracing (pluggable strategy) with a noise floor
/// 6. Douglas-Peucker simplification
/// 7. Classification
///
/// # Errors
///
/// Returns [`PipelineError::InvalidConfig`] if `config` is invalid.
pub fn detect_shapes(
    image: &RgbaImage,
    config: &DetectionConfig,
) -> Result<Vec<ShapeRecord>, PipelineError> {
    config.validate()?;

    // 1. Grayscale.
    let gray = grayscale::to_grayscale(image);

    // 2-7.
    Ok(shapes_from_luma(&gray, config))
}

/// Detect shapes in a bitmap that is already a luminance buffer.
///
/// Skips grayscale conversion; otherwise identical to [`detect_shapes`].
///
/// # Errors
///
/// Returns [`PipelineError::InvalidConfig`] if `config` is invalid.
pub fn detect_shapes_luma(
    gray: &GrayImage,
    config: &DetectionConfig,
) -> Result<Vec<ShapeRecord>, PipelineError> {
    config.validate()?;
    Ok(shapes_from_luma(gray, config))
}

/// Detect shapes in a binary edge map (255 = edge).
///
/// Runs only tracing, simplification and classification. Useful for
/// synthetic outlines and for edge maps produced elsewhere.
///
/// # Errors
///
/// Returns [`PipelineError::InvalidConfig`] if `config` is invalid.
pub fn detect_shapes_in_edge_map(
    edges: &GrayImage,
    config: &DetectionConfig,
) -> Result<Vec<ShapeRecord>, PipelineError> {
    config.validate()?;
    Ok(shapes_from_edges(edges, config))
}

/// Decode image bytes and detect shapes.
///
/// Returns the shape records together with the image dimensions, which
/// export serializers need for their coordinate space.
///
/// # Errors
///
/// Returns [`PipelineError::EmptyInput`] if `image_bytes` is empty,
/// [`PipelineError::ImageDecode`] if the image format is unrecognized,
/// and [`PipelineError::InvalidConfig`] if `config` is invalid.
pub fn process(
    image_bytes: &[u8],
    config: &DetectionConfig,
) -> Result<DetectionResult, PipelineError> {
    config.validate()?;
    let image = grayscale::decode(image_bytes)?;
    let dimensions = Dimensions {
        width: image.width(),
        height: image.height(),
    };
    let shapes = shapes_from_luma(&grayscale::to_grayscale(&image), config);
    Ok(DetectionResult { shapes, dimensions })
}

/// Decode image bytes and run the staged pipeline, keeping every
/// intermediate.
///
/// # Errors
///
/// Same conditions as [`process`].
pub fn process_staged(
    image_bytes: &[u8],
    config: &DetectionConfig,
) -> Result<StagedResult, PipelineError> {
    config.validate()?;
    let image = grayscale::decode(image_bytes)?;
    Ok(Pipeline::new(image, config.clone())?
        .grayscale()
        .blur()
        .gradient()
        .threshold()
        .trace_contours()
        .simplify()
        .classify()
        .into_result())
}

fn shapes_from_luma(gray: &GrayImage, config: &DetectionConfig) -> Vec<ShapeRecord> {
    // 2. Gaussian blur.
    let blurred = blur::gaussian_blur(gray);

    // 3. Sobel gradient.
    let gradient = edge::sobel_magnitude(&blurred);

    // 4. Threshold.
    let edges = edge::threshold(&gradient, config.edge_threshold);

    // 5-7.
    shapes_from_edges(&edges, config)
}

fn shapes_from_edges(edges: &GrayImage, config: &DetectionConfig) -> Vec<ShapeRecord> {
    // 5. Contour tracing with the noise floor.
    let contours = config.contour_tracer.trace(edges, config.min_contour_points);

    // 6. Douglas-Peucker.
    let simplified = simplify::simplify_all(&contours, config.simplify_tolerance);

    // 7. Classification.
    classify::classify_all(&simplified)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::f64::consts::TAU;

    use super::*;

    /// One-pixel outline of the `width` x `height` box with top-left at
    /// (`x`, `y`), corner pixels left out the way a blurred edge map
    /// rounds them off.
    fn draw_rect_outline(img: &mut GrayImage, x: u32, y: u32, width: u32, height: u32) {
        let (right, bottom) = (x + width - 1, y + height - 1);
        for xx in x + 1..right {
            img.put_pixel(xx, y, image::Luma([255]));
            img.put_pixel(xx, bottom, image::Luma([255]));
        }
        for yy in y + 1..bottom {
            img.put_pixel(x, yy, image::Luma([255]));
            img.put_pixel(right, yy, image::Luma([255]));
        }
    }

    /// Rectangle whose box is within a pixel of `expected` on every side.
    fn assert_rect_near(shape: &Shape, expected: [f64; 4]) {
        let Shape::Rectangle {
            x,
            y,
            width,
            height,
        } = *shape
        else {
            assert_eq!(shape.kind(), ShapeKind::Rectangle);
            return;
        };
        let (left, top) = (x, y);
        let (right, bottom) = (x + width, y + height);
        let [ex, ey, ew, eh] = expected;
        for (got, want) in [(left, ex), (top, ey), (right, ex + ew), (bottom, ey + eh)] {
            assert!((got - want).abs() <= 1.0, "{shape:?} vs {expected:?}");
        }
    }

    /// Circle outline sampled at 720 evenly spaced angles.
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::suboptimal_flops
    )]
    fn draw_circle_outline(img: &mut GrayImage, cx: f64, cy: f64, radius: f64) {
        for k in 0..720 {
            let t = TAU * f64::from(k) / 720.0;
            let x = (cx + radius * t.cos()).round() as u32;
            let y = (cy + radius * t.sin()).round() as u32;
            img.put_pixel(x, y, image::Luma([255]));
        }
    }

    /// Straight segment from `a` to `b`, one pixel per major-axis step.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn draw_segment(img: &mut GrayImage, a: (i32, i32), b: (i32, i32)) {
        let (dx, dy) = (b.0 - a.0, b.1 - a.1);
        let n = dx.abs().max(dy.abs());
        for k in 0..=n {
            let x = (f64::from(a.0) + f64::from(dx * k) / f64::from(n)).round() as u32;
            let y = (f64::from(a.1) + f64::from(dy * k) / f64::from(n)).round() as u32;
            img.put_pixel(x, y, image::Luma([255]));
        }
    }

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

    fn config() -> DetectionConfig {
        DetectionConfig::default()
    }

    // ─────────── Edge map fixtures ─────────────────────────────

    #[test]
    fn rectangle_outline_round_trips() {
        let mut edges = GrayImage::new(60, 40);
        draw_rect_outline(&mut edges, 10, 8, 41, 23);

        let shapes = detect_shapes_in_edge_map(&edges, &config()).unwrap();
        assert_eq!(shapes.len(), 1);
        assert_rect_near(&shapes[0].shape, [10.0, 8.0, 40.0, 22.0]);
    }

    #[test]
    fn sharp_cornered_outline_picks_up_its_last_corner() {
        // With the corner pixels present the fill reaches the bottom-left
        // corner last, so the simplified outline carries an extra vertex.
        let mut edges = GrayImage::new(60, 40);
        draw_rect_outline(&mut edges, 10, 8, 41, 23);
        for (x, y) in [(10, 8), (50, 8), (10, 30), (50, 30)] {
            edges.put_pixel(x, y, image::Luma([255]));
        }

        let shapes = detect_shapes_in_edge_map(&edges, &config()).unwrap();
        assert_eq!(shapes.len(), 1);
        assert_eq!(shapes[0].kind(), ShapeKind::Polygon);
        assert_eq!(shapes[0].outline.last(), Some(&Point::new(10.0, 30.0)));
    }

    #[test]
    fn square_outline_round_trips() {
        let mut edges = GrayImage::new(50, 50);
        draw_rect_outline(&mut edges, 5, 5, 30, 30);

        let shapes = detect_shapes_in_edge_map(&edges, &config()).unwrap();
        assert_eq!(shapes.len(), 1);
        assert_rect_near(&shapes[0].shape, [5.0, 5.0, 29.0, 29.0]);
    }

    #[test]
    fn circle_outline_radius_within_ten_percent() {
        for radius in [20.0, 25.0, 30.0] {
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let size = (2.0f64.mul_add(radius, 40.0)) as u32;
            let center = radius + 20.0;
            let mut edges = GrayImage::new(size, size);
            draw_circle_outline(&mut edges, center, center, radius);

            let shapes = detect_shapes_in_edge_map(&edges, &config()).unwrap();
            assert_eq!(shapes.len(), 1, "radius {radius}");
            match &shapes[0].shape {
                Shape::Circle { radius: r, .. } => {
                    assert!(
                        (r - radius).abs() < 0.1 * radius,
                        "radius {radius}: reported {r}"
                    );
                }
                other => assert_eq!(other.kind(), ShapeKind::Circle),
            }
        }
    }

    #[test]
    fn triangle_outline_is_a_triangle() {
        let mut edges = GrayImage::new(60, 60);
        let corners = [(10, 40), (50, 40), (30, 10)];
        for i in 0..3 {
            draw_segment(&mut edges, corners[i], corners[(i + 1) % 3]);
        }

        let shapes = detect_shapes_in_edge_map(&edges, &config()).unwrap();
        assert_eq!(shapes.len(), 1);
        assert_eq!(
            shapes[0].shape,
            Shape::Triangle {
                vertices: [
                    Point::new(30.0, 10.0),
                    Point::new(50.0, 40.0),
                    Point::new(10.0, 40.0),
                ],
            }
        );
        assert_eq!(shapes[0].outline.len(), 4);
    }

    #[test]
    fn shapes_are_in_discovery_order() {
        let mut edges = GrayImage::new(120, 60);
        draw_rect_outline(&mut edges, 5, 5, 30, 20);
        draw_circle_outline(&mut edges, 80.0, 30.0, 20.0);

        let shapes = detect_shapes_in_edge_map(&edges, &config()).unwrap();
        let kinds: Vec<ShapeKind> = shapes.iter().map(ShapeRecord::kind).collect();
        assert_eq!(kinds, [ShapeKind::Rectangle, ShapeKind::Circle]);
        assert_rect_near(&shapes[0].shape, [5.0, 5.0, 29.0, 19.0]);
    }

    #[test]
    fn fewer_than_ten_edge_pixels_is_empty() {
        let mut edges = GrayImage::new(20, 20);
        for y in 5..8 {
            for x in 5..8 {
                edges.put_pixel(x, y, image::Luma([255]));
            }
        }
        assert!(detect_shapes_in_edge_map(&edges, &config()).unwrap().is_empty());
    }

    #[test]
    fn straight_run_is_unclassifiable() {
        let mut edges = GrayImage::new(20, 20);
        for x in 3..13 {
            edges.put_pixel(x, 10, image::Luma([255]));
        }
        // Survives the noise floor but simplifies to two endpoints.
        assert!(detect_shapes_in_edge_map(&edges, &config()).unwrap().is_empty());
    }

    // ─────────── Full pipeline ─────────────────────────────────

    #[test]
    fn black_image_has_no_shapes() {
        let img = RgbaImage::from_pixel(32, 32, image::Rgba([0, 0, 0, 255]));
        assert!(detect_shapes(&img, &config()).unwrap().is_empty());
    }

    #[test]
    fn uniform_bright_image_yields_border_ring() {
        // The unprocessed blur border turns into a gradient ring one pixel
        // inside the image edge. Its corners are sharp, so it comes back
        // as a polygon spanning the ring.
        for gray in [30, 128, 255] {
            let img = RgbaImage::from_pixel(20, 20, image::Rgba([gray, gray, gray, 255]));
            let shapes = detect_shapes(&img, &config()).unwrap();
            assert_eq!(shapes.len(), 1, "gray {gray}");
            assert_eq!(shapes[0].kind(), ShapeKind::Polygon);
            let bb = geometry::bounding_box(shapes[0].outline.points()).unwrap();
            assert_eq!(
                (bb.min_x, bb.min_y, bb.max_x, bb.max_y),
                (1.0, 1.0, 18.0, 18.0)
            );
        }
    }

    #[test]
    fn filled_rectangle_yields_one_shape() {
        let img = RgbaImage::from_fn(60, 40, |x, y| {
            if (10..50).contains(&x) && (8..30).contains(&y) {
                image::Rgba([255, 255, 255, 255])
            } else {
                image::Rgba([0, 0, 0, 255])
            }
        });
        assert_eq!(detect_shapes(&img, &config()).unwrap().len(), 1);
    }

    #[test]
    fn filled_disc_is_a_circle() {
        let mut img = RgbaImage::from_pixel(120, 120, image::Rgba([0, 0, 0, 255]));
        imageproc::drawing::draw_filled_circle_mut(
            &mut img,
            (60, 60),
            30,
            image::Rgba([255, 255, 255, 255]),
        );

        let shapes = detect_shapes(&img, &config()).unwrap();
        assert_eq!(shapes.len(), 1);
        match &shapes[0].shape {
            Shape::Circle { center, radius } => {
                assert!((radius - 30.0).abs() < 3.0, "radius {radius}");
                assert!(center.distance(Point::new(60.0, 60.0)) < 3.0);
            }
            other => assert_eq!(other.kind(), ShapeKind::Circle),
        }
    }

    #[test]
    fn luma_entry_point_matches_rgba() {
        let img = RgbaImage::from_fn(60, 40, |x, y| {
            if (10..50).contains(&x) && (8..30).contains(&y) {
                image::Rgba([200, 180, 90, 255])
            } else {
                image::Rgba([10, 10, 10, 255])
            }
        });
        let from_rgba = detect_shapes(&img, &config()).unwrap();
        let from_luma = detect_shapes_luma(&to_grayscale(&img), &config()).unwrap();
        assert_eq!(from_rgba, from_luma);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let bad = DetectionConfig {
            simplify_tolerance: f64::INFINITY,
            ..config()
        };
        let img = RgbaImage::new(4, 4);
        assert!(matches!(
            detect_shapes(&img, &bad),
            Err(PipelineError::InvalidConfig(_))
        ));
        assert!(detect_shapes_in_edge_map(&GrayImage::new(4, 4), &bad).is_err());
    }

    // ─────────── Encoded input ─────────────────────────────────

    #[test]
    fn process_empty_input() {
        let result = process(&[], &config());
        assert!(matches!(result, Err(PipelineError::EmptyInput)));
    }

    #[test]
    fn process_invalid_image() {
        let result = process(&[0xFF, 0x00, 0x42], &config());
        assert!(matches!(result, Err(PipelineError::ImageDecode(_))));
    }

    #[test]
    fn process_reports_dimensions() {
        let img = RgbaImage::from_pixel(20, 20, image::Rgba([128, 128, 128, 255]));
        let result = process(&encode_png(&img), &config()).unwrap();
        assert_eq!(
            result.dimensions,
            Dimensions {
                width: 20,
                height: 20
            }
        );
        assert_eq!(result.shapes.len(), 1);
    }

    #[test]
    fn process_staged_matches_process() {
        let img = RgbaImage::from_fn(60, 40, |x, y| {
            if (10..50).contains(&x) && (8..30).contains(&y) {
                image::Rgba([255, 255, 255, 255])
            } else {
                image::Rgba([0, 0, 0, 255])
            }
        });
        let png = encode_png(&img);
        let staged = process_staged(&png, &config()).unwrap();
        let direct = process(&png, &config()).unwrap();
        assert_eq!(staged.shapes, direct.shapes);
        assert_eq!(staged.dimensions, direct.dimensions);
        assert_eq!(staged.original.as_raw(), img.as_raw());
    }

    #[test]
    fn border_following_tracer_runs() {
        let mut edges = GrayImage::new(60, 40);
        draw_rect_outline(&mut edges, 10, 8, 41, 23);
        let config = DetectionConfig {
            contour_tracer: ContourTracerKind::BorderFollowing,
            ..config()
        };
        let shapes = detect_shapes_in_edge_map(&edges, &config).unwrap();
        assert!(!shapes.is_empty());
        assert!(shapes.iter().all(|s| s.outline.len() >= 3));
    }
}
