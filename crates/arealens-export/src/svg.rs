//! SVG export serializer.
//!
//! Converts shape records into an SVG document in pixel coordinates using
//! the [`svg`] crate for document construction, XML escaping and attribute
//! formatting. Layering the document over the source image reproduces the
//! on-screen annotation.
//!
//! Each record becomes a `<g>` holding one geometry element and a text
//! label:
//!
//! - Rectangle: `<rect>`
//! - Circle: `<circle>`
//! - Triangle and polygon: `<polygon>`
//!
//! Labels are 1-based sequence numbers placed just above the shape.
//! Stroke colors come from the cycling [`palette`](crate::palette).
//!
//! This is a pure function with no I/O -- it returns a `String`.

use svg::Document;
use svg::node::element::{Circle, Description, Element, Group, Polygon, Rectangle, Title};
use svg::node::{Node, Text};

use arealens_pipeline::{Dimensions, Point, Shape, ShapeRecord};

use crate::palette::{hex, palette_color};

/// Vertical gap between a shape's top edge and its label baseline.
const LABEL_OFFSET: f64 = 4.0;

/// Stroke width for shape outlines, in pixels.
const STROKE_WIDTH: f64 = 2.0;

/// Metadata to embed in the SVG document.
///
/// Both fields are optional. When present, a `<title>` and/or `<desc>`
/// element is emitted immediately after the opening `<svg>` tag.
///
/// Text values are XML-escaped automatically by the `svg` crate.
#[derive(Debug, Clone, Default)]
pub struct SvgMetadata<'a> {
    /// Document title, emitted as `<title>`.
    ///
    /// Typically the source image filename (without extension).
    pub title: Option<&'a str>,

    /// Document description, emitted as `<desc>`.
    ///
    /// Typically the scale and detection parameters.
    pub description: Option<&'a str>,
}

/// Serialize shape records into an SVG document string.
///
/// The document's `width`, `height` and `viewBox` match `dimensions`, so
/// coordinates are image pixels.
#[must_use]
pub fn to_svg(records: &[ShapeRecord], dimensions: Dimensions, metadata: &SvgMetadata<'_>) -> String {
    let w = dimensions.width;
    let h = dimensions.height;
    let mut doc = Document::new()
        .set("width", w)
        .set("height", h)
        .set("viewBox", (0, 0, w, h));

    if let Some(title) = metadata.title {
        doc = doc.add(Title::new(title));
    }

    if let Some(description) = metadata.description {
        doc = doc.add(Description::new().add(Text::new(description)));
    }

    for (i, record) in records.iter().enumerate() {
        let number = i + 1;
        let color = hex(palette_color(i));

        let (geometry, anchor) = shape_element(&record.shape, &color);

        let mut label = Element::new("text");
        label.assign("x", anchor.x);
        label.assign("y", anchor.y - LABEL_OFFSET);
        label.assign("fill", color.as_str());
        label.assign("font-family", "sans-serif");
        label.assign("font-size", 12);
        label.append(Text::new(number.to_string()));

        let group = Group::new()
            .set("id", format!("shape-{number}"))
            .set("class", record.kind().as_str())
            .add(geometry)
            .add(label);
        doc = doc.add(group);
    }

    // The svg crate omits the XML declaration, so we prepend it.
    format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n{doc}\n")
}

/// Geometry element for `shape` and the point its label hangs from.
fn shape_element(shape: &Shape, color: &str) -> (Box<dyn Node>, Point) {
    match shape {
        Shape::Rectangle {
            x,
            y,
            width,
            height,
        } => {
            let el = Rectangle::new()
                .set("x", *x)
                .set("y", *y)
                .set("width", *width)
                .set("height", *height);
            (Box::new(styled(el, color)), Point::new(*x, *y))
        }
        Shape::Circle { center, radius } => {
            let el = Circle::new()
                .set("cx", center.x)
                .set("cy", center.y)
                .set("r", *radius);
            (
                Box::new(styled(el, color)),
                Point::new(center.x, center.y - radius),
            )
        }
        Shape::Triangle { vertices } => polygon_element(vertices, color),
        Shape::Polygon { vertices } => polygon_element(vertices, color),
    }
}

fn polygon_element(vertices: &[Point], color: &str) -> (Box<dyn Node>, Point) {
    let points = vertices
        .iter()
        .map(|p| format!("{},{}", p.x, p.y))
        .collect::<Vec<_>>()
        .join(" ");
    let el = Polygon::new().set("points", points);

    // Label sits over the topmost vertex; the first one wins ties.
    let top = vertices
        .iter()
        .copied()
        .reduce(|top, p| if p.y < top.y { p } else { top })
        .unwrap_or(Point::new(0.0, 0.0));

    (Box::new(styled(el, color)), top)
}

fn styled<N: Node>(mut el: N, color: &str) -> N {
    el.assign("fill", "none");
    el.assign("stroke", color);
    el.assign("stroke-width", STROKE_WIDTH);
    el
}
