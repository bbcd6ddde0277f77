//! Grid-based spatial index for color lookups in a reference document.

use glam::DVec2;
use tracing::{debug, info};

use crate::constants::COLOR_INDEX_CELL_SIZE;
use crate::error::{Result, ToolpathError};
use crate::grid::SpatialGrid;
use crate::reference::{ReferenceDocument, ReferencePath};
use crate::types::ColorSample;

use super::ColorSampler;

/// A reference segment carrying the pressure of the path it belongs to
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColoredSegment {
    pub start: DVec2,
    pub end: DVec2,
    pub sample: ColorSample,
}

impl ColoredSegment {
    /// Euclidean distance from `point` to the closest point of the segment
    pub fn distance_to(&self, point: DVec2) -> f64 {
        let direction = self.end - self.start;
        let length_sq = direction.length_squared();
        if length_sq == 0.0 {
            return point.distance(self.start);
        }
        let t = ((point - self.start).dot(direction) / length_sq).clamp(0.0, 1.0);
        point.distance(self.start + direction * t)
    }
}

/// Nearest-segment color lookup over a reference document.
///
/// Segments are bucketed into a uniform grid; a query scans rings of cells
/// outwards from the query cell and stops as soon as no unscanned cell can
/// hold anything closer than the best match. Colors are per path, so the
/// answer is the color of the nearest reference path.
#[derive(Debug, Clone)]
pub struct SpatialColorIndex {
    grid: SpatialGrid<usize>,
    segments: Vec<ColoredSegment>,
    bounds: Option<(DVec2, DVec2)>,
    /// Added to every query point before lookup
    offset: DVec2,
}

impl SpatialColorIndex {
    /// Create an empty index with the given grid cell size (mm)
    pub fn new(cell_size: f64) -> Result<Self> {
        brushpath_config::positive("cell_size", cell_size)?;
        Ok(Self {
            grid: SpatialGrid::new(cell_size),
            segments: Vec::new(),
            bounds: None,
            offset: DVec2::ZERO,
        })
    }

    /// Index every path of a reference document
    ///
    /// Fails with `ReferenceUnavailable` if the document has no colored
    /// geometry.
    pub fn from_document(document: &ReferenceDocument) -> Result<Self> {
        Self::from_document_with_cell_size(document, COLOR_INDEX_CELL_SIZE)
    }

    pub fn from_document_with_cell_size(
        document: &ReferenceDocument,
        cell_size: f64,
    ) -> Result<Self> {
        let mut index = Self::new(cell_size)?;
        for path in &document.paths {
            index.add_path(path);
        }
        if index.is_empty() {
            return Err(ToolpathError::ReferenceUnavailable(
                "reference document contains no colored geometry".to_string(),
            ));
        }

        if let Some((min, max)) = index.bounds {
            info!(
                "Indexed {} reference segments, bounds ({:.1}, {:.1}) to ({:.1}, {:.1})",
                index.len(),
                min.x,
                min.y,
                max.x,
                max.y
            );
        }
        Ok(index)
    }

    /// Add one segment
    pub fn add_segment(&mut self, start: DVec2, end: DVec2, sample: ColorSample) {
        let id = self.segments.len();
        self.segments.push(ColoredSegment { start, end, sample });
        self.grid.insert_segment(start, end, id);

        let (min, max) = self.bounds.unwrap_or((start, start));
        self.bounds = Some((min.min(start).min(end), max.max(start).max(end)));
    }

    /// Add a path's segments; a single-point path becomes a zero-length segment
    pub fn add_path(&mut self, path: &ReferencePath) {
        let sample = path.sample();
        match path.points.as_slice() {
            [] => {}
            [only] => self.add_segment(*only, *only, sample),
            points => {
                for pair in points.windows(2) {
                    self.add_segment(pair[0], pair[1], sample);
                }
            }
        }
    }

    /// Use a fixed offset for query points
    pub fn with_offset(mut self, offset: DVec2) -> Self {
        self.offset = offset;
        self
    }

    /// Offset query points by the indexed geometry's minimum corner
    ///
    /// For working documents whose coordinates were normalized to start at
    /// the origin while the reference keeps its own placement.
    pub fn aligned_to_bounds(mut self) -> Self {
        if let Some((min, _)) = self.bounds {
            debug!("Aligning reference lookups to ({:.3}, {:.3})", min.x, min.y);
            self.offset = min;
        }
        self
    }

    pub fn offset(&self) -> DVec2 {
        self.offset
    }

    /// Bounding box of the indexed geometry (min, max)
    pub fn bounds(&self) -> Option<(DVec2, DVec2)> {
        self.bounds
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Nearest segment to a point in reference coordinates (offset not applied)
    ///
    /// Ties go to the segment indexed first.
    pub fn nearest(&self, point: DVec2) -> Option<(&ColoredSegment, f64)> {
        let center = self.grid.cell_of(point);
        // Rings closer than the occupied extent are empty
        let min_ring = self.grid.min_ring(center)?;
        let max_ring = self.grid.max_ring(center)?;
        let cell_size = self.grid.cell_size();

        let mut best: Option<(usize, f64)> = None;
        for ring in min_ring..=max_ring {
            for id in self.grid.ring(center, ring) {
                let distance = self.segments[id].distance_to(point);
                let closer = match best {
                    None => true,
                    Some((best_id, best_distance)) => {
                        distance < best_distance || (distance == best_distance && id < best_id)
                    }
                };
                if closer {
                    best = Some((id, distance));
                }
            }

            // Cells beyond this ring are at least `ring` cells away
            if let Some((_, distance)) = best {
                if distance <= ring as f64 * cell_size {
                    break;
                }
            }
        }

        best.map(|(id, distance)| (&self.segments[id], distance))
    }
}

impl ColorSampler for SpatialColorIndex {
    fn spatial_color(&self, point: DVec2) -> Result<ColorSample> {
        self.nearest(point + self.offset)
            .map(|(segment, _)| segment.sample)
            .ok_or_else(|| {
                ToolpathError::ReferenceUnavailable("reference index is empty".to_string())
            })
    }
}
