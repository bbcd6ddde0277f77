//! Color-to-pressure sampling
//!
//! This module provides:
//! - [`ColorSampler`] - the capability the pressure engine queries
//! - [`LayerColorSampler`] - per-layer constant colors, no reference document
//! - [`SpatialColorIndex`] - nearest-segment lookup in a reference document
//!
//! The pressure engine only sees the trait, so its mode logic is the same
//! whichever backing implementation a run uses.

mod layer;
mod spatial;

use glam::DVec2;

use crate::error::Result;
use crate::types::{ColorSample, Layer};

pub use layer::LayerColorSampler;
pub use spatial::{ColoredSegment, SpatialColorIndex};

/// Maps layers and points to grayscale pressure samples.
///
/// Implementations are shared read-only across worker threads during a run.
pub trait ColorSampler: Send + Sync {
    /// Pressure for a layer's assigned color, constant across the layer
    fn layer_color(&self, layer: &Layer) -> ColorSample {
        ColorSample::from_rgb(layer.color_or_default())
    }

    /// Pressure of the reference geometry nearest to `point`
    ///
    /// Fails with `ReferenceUnavailable` when no reference document backs
    /// this sampler.
    fn spatial_color(&self, point: DVec2) -> Result<ColorSample>;
}
