//! Arc-length resampling
//!
//! Walks a stroke's polyline and places points at every multiple of the
//! target spacing, interpolating linearly inside each segment. The first and
//! last vertices are kept exactly; the final step may be shorter than the
//! spacing so the stroke still lands on its last vertex.

use glam::DVec2;

use crate::constants::POINT_EPSILON;
use crate::error::{Result, ToolpathError};
use crate::types::{ArcLengthPoint, Stroke};

/// Resamples strokes at a uniform arc-length spacing
#[derive(Debug, Clone, Copy)]
pub struct Resampler {
    spacing: f64,
}

impl Resampler {
    /// Create a resampler. `spacing` must be positive.
    pub fn new(spacing: f64) -> Result<Self> {
        brushpath_config::positive("segment_length", spacing)?;
        Ok(Self { spacing })
    }

    pub fn spacing(&self) -> f64 {
        self.spacing
    }

    /// Resample a stroke into arc-length tagged points
    ///
    /// Fails with `DegenerateStroke` when the stroke has fewer than two
    /// points or no length at all.
    pub fn resample(&self, stroke: &Stroke) -> Result<Vec<ArcLengthPoint>> {
        let points = &stroke.points;
        let total = stroke.length();
        let (Some(first), Some(last)) = (stroke.first(), stroke.last()) else {
            return Err(ToolpathError::DegenerateStroke {
                points: points.len(),
                length: total,
            });
        };
        if points.len() < 2 || total <= POINT_EPSILON {
            return Err(ToolpathError::DegenerateStroke {
                points: points.len(),
                length: total,
            });
        }

        // Samples closer than this to the end collapse onto the last vertex
        let end_margin = POINT_EPSILON.max(self.spacing * 1e-9);

        let mut samples = vec![first];
        let mut sample_index = 1u64;
        let mut walked = 0.0;

        for segment in points.windows(2) {
            let (a, b) = (segment[0], segment[1]);
            let length = a.distance(b);
            if length <= 0.0 {
                continue;
            }

            loop {
                let target = sample_index as f64 * self.spacing;
                if target > walked + length || target >= total - end_margin {
                    break;
                }
                let t = ((target - walked) / length).clamp(0.0, 1.0);
                samples.push(a.lerp(b, t));
                sample_index += 1;
            }

            walked += length;
        }

        samples.push(last);
        Ok(with_arc_length(&samples))
    }
}

/// Tag points with cumulative distance measured along the points themselves
pub fn with_arc_length(points: &[DVec2]) -> Vec<ArcLengthPoint> {
    let mut distances = Vec::with_capacity(points.len());
    let mut distance = 0.0;
    for (index, point) in points.iter().enumerate() {
        if index > 0 {
            distance += points[index - 1].distance(*point);
        }
        distances.push(distance);
    }

    let length = distance;
    points
        .iter()
        .zip(distances)
        .map(|(&position, distance)| ArcLengthPoint {
            position,
            distance,
            length,
        })
        .collect()
}
