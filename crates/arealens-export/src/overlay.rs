//! Raster overlay: shape outlines drawn over the source bitmap.
//!
//! Rendering goes through `tiny-skia`, which handles anti-aliasing and
//! sub-pixel positioning. The result is a plain [`RgbaImage`] the caller
//! can encode as PNG.

use image::{Rgba, RgbaImage};
use tiny_skia::{LineCap, LineJoin, Paint, Path, PathBuilder, Pixmap, Rect, Stroke, Transform};

use arealens_pipeline::{Point, Shape, ShapeRecord};

use crate::palette::palette_color;

/// Appearance of the rendered outlines.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayStyle {
    /// Stroke width in pixels.
    pub line_width: f32,
    /// Stroke opacity, 0 to 255.
    pub alpha: u8,
    /// Also draw the simplified contour behind each classification.
    pub show_outline: bool,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            line_width: 2.0,
            alpha: 255,
            show_outline: false,
        }
    }
}

/// Draw every record over a copy of `source`.
///
/// Each shape is stroked in its palette color (by sequence number). With
/// [`OverlayStyle::show_outline`] the simplified contour is drawn as a
/// thinner closed path in the same color. A zero-sized source is returned
/// unchanged.
#[must_use]
pub fn render_overlay(source: &RgbaImage, records: &[ShapeRecord], style: &OverlayStyle) -> RgbaImage {
    let (width, height) = source.dimensions();
    let Some(mut pixmap) = Pixmap::new(width, height) else {
        return source.clone();
    };
    load_premultiplied(&mut pixmap, source);

    let stroke = Stroke {
        width: style.line_width,
        line_cap: LineCap::Round,
        line_join: LineJoin::Round,
        ..Stroke::default()
    };
    let outline_stroke = Stroke {
        width: (style.line_width / 2.0).max(1.0),
        ..stroke.clone()
    };

    for (i, record) in records.iter().enumerate() {
        let [r, g, b] = palette_color(i).0;
        let mut paint = Paint::default();
        paint.set_color_rgba8(r, g, b, style.alpha);
        paint.anti_alias = true;

        if let Some(path) = shape_path(&record.shape) {
            pixmap.stroke_path(&path, &paint, &stroke, Transform::identity(), None);
        }
        if style.show_outline
            && let Some(path) = closed_path(record.outline.points())
        {
            pixmap.stroke_path(&path, &paint, &outline_stroke, Transform::identity(), None);
        }
    }

    store_straight(&pixmap)
}

#[allow(clippy::cast_possible_truncation)]
fn shape_path(shape: &Shape) -> Option<Path> {
    match shape {
        Shape::Rectangle {
            x,
            y,
            width,
            height,
        } => {
            let rect = Rect::from_xywh(*x as f32, *y as f32, *width as f32, *height as f32)?;
            Some(PathBuilder::from_rect(rect))
        }
        Shape::Circle { center, radius } => {
            PathBuilder::from_circle(center.x as f32, center.y as f32, *radius as f32)
        }
        Shape::Triangle { vertices } => closed_path(vertices),
        Shape::Polygon { vertices } => closed_path(vertices),
    }
}

/// Closed path through `points`, or `None` for fewer than two points.
#[allow(clippy::cast_possible_truncation)]
fn closed_path(points: &[Point]) -> Option<Path> {
    let (first, rest) = points.split_first()?;
    if rest.is_empty() {
        return None;
    }
    let mut pb = PathBuilder::new();
    pb.move_to(first.x as f32, first.y as f32);
    for p in rest {
        pb.line_to(p.x as f32, p.y as f32);
    }
    pb.close();
    pb.finish()
}

/// Copy straight RGBA into the pixmap's premultiplied storage.
#[allow(clippy::cast_possible_truncation)]
fn load_premultiplied(pixmap: &mut Pixmap, source: &RgbaImage) {
    for (dst, src) in pixmap.data_mut().chunks_exact_mut(4).zip(source.pixels()) {
        let [r, g, b, a] = src.0;
        let alpha = u16::from(a);
        dst[0] = (u16::from(r) * alpha / 255) as u8;
        dst[1] = (u16::from(g) * alpha / 255) as u8;
        dst[2] = (u16::from(b) * alpha / 255) as u8;
        dst[3] = a;
    }
}

/// Convert the pixmap (premultiplied RGBA) back to straight RGBA.
#[allow(clippy::cast_possible_truncation)]
fn store_straight(pixmap: &Pixmap) -> RgbaImage {
    let mut img = RgbaImage::new(pixmap.width(), pixmap.height());
    for (pixel, src) in img.pixels_mut().zip(pixmap.data().chunks_exact(4)) {
        let a = src[3];
        *pixel = if a == 0 {
            Rgba([0, 0, 0, 0])
        } else {
            // Un-premultiply: channel = premultiplied * 255 / alpha.
            let alpha = u16::from(a);
            Rgba([
                (u16::from(src[0]) * 255 / alpha) as u8,
                (u16::from(src[1]) * 255 / alpha) as u8,
                (u16::from(src[2]) * 255 / alpha) as u8,
                a,
            ])
        };
    }
    img
}

#[cfg(test)]
mod tests {
    use arealens_pipeline::Contour;

    use super::*;
    use crate::palette::PALETTE;

    fn black(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 255]))
    }

    fn record(shape: Shape) -> ShapeRecord {
        ShapeRecord {
            shape,
            outline: Contour::default(),
        }
    }

    /// Opaque and within a couple of levels of `color` on every channel.
    fn assert_painted(pixel: Rgba<u8>, color: image::Rgb<u8>) {
        assert_eq!(pixel.0[3], 255);
        for (got, want) in pixel.0.iter().zip(color.0) {
            assert!(got.abs_diff(want) <= 2, "{pixel:?} vs {color:?}");
        }
    }

    #[test]
    fn no_records_leaves_image_unchanged() {
        let src = RgbaImage::from_fn(8, 6, |x, y| Rgba([x as u8 * 30, y as u8 * 40, 7, 255]));
        let out = render_overlay(&src, &[], &OverlayStyle::default());
        assert_eq!(out, src);
    }

    #[test]
    fn zero_sized_source_is_returned() {
        let src = RgbaImage::new(0, 0);
        let out = render_overlay(&src, &[], &OverlayStyle::default());
        assert_eq!(out.dimensions(), (0, 0));
    }

    #[test]
    fn rectangle_edge_takes_palette_color() {
        let src = black(40, 40);
        let records = [record(Shape::Rectangle {
            x: 10.0,
            y: 10.0,
            width: 20.0,
            height: 20.0,
        })];
        let style = OverlayStyle {
            line_width: 3.0,
            ..OverlayStyle::default()
        };
        let out = render_overlay(&src, &records, &style);

        // Pixel just inside the left edge is fully covered.
        assert_painted(*out.get_pixel(10, 20), PALETTE[0]);
        // Interior and far background are untouched.
        assert_eq!(*out.get_pixel(20, 20), Rgba([0, 0, 0, 255]));
        assert_eq!(*out.get_pixel(2, 2), Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn circle_is_stroked_on_its_rim() {
        let src = black(60, 60);
        let records = [
            record(Shape::Rectangle {
                x: 0.0,
                y: 0.0,
                width: 1.0,
                height: 1.0,
            }),
            record(Shape::Circle {
                center: Point::new(30.0, 30.0),
                radius: 15.0,
            }),
        ];
        let style = OverlayStyle {
            line_width: 3.0,
            ..OverlayStyle::default()
        };
        let out = render_overlay(&src, &records, &style);
        // Rightmost point of the rim, at (45, 30).
        assert_painted(*out.get_pixel(45, 30), PALETTE[1]);
        assert_eq!(*out.get_pixel(30, 30), Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn translucent_stroke_blends() {
        let src = black(40, 40);
        let records = [record(Shape::Rectangle {
            x: 10.0,
            y: 10.0,
            width: 20.0,
            height: 20.0,
        })];
        let style = OverlayStyle {
            line_width: 3.0,
            alpha: 128,
            ..OverlayStyle::default()
        };
        let out = render_overlay(&src, &records, &style);
        let px = out.get_pixel(10, 20).0;
        assert_eq!(px[3], 255);
        assert!(px[0] > 0 && px[0] < PALETTE[0].0[0]);
    }

    #[test]
    fn outline_drawn_only_when_enabled() {
        let src = black(50, 50);
        let outline = Contour::new(vec![
            Point::new(5.0, 40.0),
            Point::new(45.0, 40.0),
            Point::new(25.0, 5.0),
        ]);
        let records = [ShapeRecord {
            shape: Shape::Circle {
                center: Point::new(0.0, 0.0),
                radius: 1.0,
            },
            outline,
        }];
        let style = OverlayStyle {
            line_width: 4.0,
            ..OverlayStyle::default()
        };

        let plain = render_overlay(&src, &records, &style);
        assert_eq!(*plain.get_pixel(25, 40), Rgba([0, 0, 0, 255]));

        let with_outline = render_overlay(
            &src,
            &records,
            &OverlayStyle {
                show_outline: true,
                ..style
            },
        );
        assert_ne!(*with_outline.get_pixel(25, 40), Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn degenerate_paths_are_skipped() {
        assert!(closed_path(&[]).is_none());
        assert!(closed_path(&[Point::new(1.0, 1.0)]).is_none());
        assert!(
            shape_path(&Shape::Rectangle {
                x: 0.0,
                y: 0.0,
                width: -4.0,
                height: 5.0,
            })
            .is_none()
        );
    }
}
