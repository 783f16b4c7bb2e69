//! arealens-export: Pure serializers for analysis results (sans-IO)
//!
//! Turns detected shapes into a JSON measurement report, an SVG overlay
//! document and a rasterized overlay bitmap. Every function returns data;
//! writing files is the caller's job.

pub mod overlay;
pub mod palette;
pub mod report;
pub mod svg;

pub use overlay::{OverlayStyle, render_overlay};
pub use palette::{PALETTE, palette_color};
pub use report::{AnalysisReport, ImageInfo, MeasuredShape, analyze};
pub use svg::{SvgMetadata, to_svg};

/// Errors from producing an export.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// JSON serialization failed.
    #[error("failed to serialize JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Detection failed before anything could be exported.
    #[error(transparent)]
    Pipeline(#[from] arealens_pipeline::PipelineError),
}
