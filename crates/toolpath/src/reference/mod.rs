//! Reference documents for spatial color lookup.
//!
//! A reference document is an independently loaded vector drawing whose
//! path colors drive per-point pressure in spatial mode. It is never drawn;
//! only its geometry and colors are indexed.
//!
//! - [`ReferenceDocument`] - colored polylines in millimeters
//! - [`parse_svg`] - builds a document from SVG text

mod paint;
mod path_data;
mod svg;

use glam::DVec2;
use thiserror::Error;

use crate::constants::FALLBACK_PRESSURE;
use crate::types::{ColorSample, Rgb};

pub use paint::{parse_color, Paint};
pub use path_data::parse_path_data;
pub use svg::parse_svg;

#[derive(Debug, Error)]
pub enum ReferenceError {
    #[error("Malformed SVG: {0}")]
    Xml(#[from] roxmltree::Error),
    #[error("Reference document contains no colored geometry")]
    NoColoredGeometry,
}

/// One colored polyline of a reference document (mm)
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReferencePath {
    pub points: Vec<DVec2>,
    /// Path color; `None` when the paint could not be parsed
    pub color: Option<Rgb>,
}

impl ReferencePath {
    /// Pressure for this path's color (mid pressure for unknown paint)
    pub fn sample(&self) -> ColorSample {
        match self.color {
            Some(color) => ColorSample::from_rgb(color),
            None => ColorSample::new(FALLBACK_PRESSURE),
        }
    }
}

/// Colored geometry of a reference drawing
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReferenceDocument {
    pub paths: Vec<ReferencePath>,
}

impl ReferenceDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, points: Vec<DVec2>, color: Option<Rgb>) {
        self.paths.push(ReferencePath { points, color });
    }

    pub fn is_empty(&self) -> bool {
        self.paths.iter().all(|path| path.points.is_empty())
    }
}
