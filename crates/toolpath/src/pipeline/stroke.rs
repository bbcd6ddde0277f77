//! Per-stroke processing for the toolpath pipeline

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use tracing::trace;

use crate::error::Result;
use crate::pressure::{LayerPlan, PressureEngine};
use crate::types::{PressurePoint, Stroke};

use super::BrushPipeline;

impl BrushPipeline {
    /// Resample, apply pressure and smooth a single stroke
    pub fn process_stroke(
        &self,
        engine: &PressureEngine<'_>,
        plan: &LayerPlan,
        stroke: &Stroke,
    ) -> Result<Vec<PressurePoint>> {
        let samples = self.resampler.resample(stroke)?;
        let mut points = engine.apply(plan, &samples)?;
        if self.smooths() {
            self.smoother.smooth(&mut points);
        }
        trace!(
            "Stroke of {} points resampled to {}",
            stroke.len(),
            points.len()
        );
        Ok(points)
    }

    /// Process a layer's strokes, one result per stroke in input order
    #[cfg(feature = "parallel")]
    pub(crate) fn process_strokes(
        &self,
        engine: &PressureEngine<'_>,
        plan: &LayerPlan,
        strokes: &[Stroke],
    ) -> Vec<Result<Vec<PressurePoint>>> {
        strokes
            .par_iter()
            .map(|stroke| self.process_stroke(engine, plan, stroke))
            .collect()
    }

    /// Process a layer's strokes, one result per stroke in input order
    #[cfg(not(feature = "parallel"))]
    pub(crate) fn process_strokes(
        &self,
        engine: &PressureEngine<'_>,
        plan: &LayerPlan,
        strokes: &[Stroke],
    ) -> Vec<Result<Vec<PressurePoint>>> {
        strokes
            .iter()
            .map(|stroke| self.process_stroke(engine, plan, stroke))
            .collect()
    }
}
