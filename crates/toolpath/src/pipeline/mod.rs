//! Complete toolpath pipeline
//!
//! This module connects the stages for a whole document:
//! - Stroke merging (per layer)
//! - Resampling, pressure and smoothing (per stroke)
//! - G-code emission
//!
//! Strokes of a layer are processed on the rayon thread pool when the
//! `parallel` feature is enabled. Output order always matches input order.

mod program;
mod stroke;

use brushpath_config::{BrushConfig, PressureMode};
use glam::DVec2;
use tracing::{debug, info, warn};

use crate::color::{ColorSampler, LayerColorSampler, SpatialColorIndex};
use crate::emit::MotionEmitter;
use crate::error::{Result, ToolpathError};
use crate::merge::StrokeMerger;
use crate::pressure::{PressureEngine, PressureProfile, ZRange};
use crate::reference::ReferenceDocument;
use crate::resample::Resampler;
use crate::smooth::Smoother;
use crate::types::{Layer, Toolpath};

pub use program::{LayerSummary, ToolpathProgram};

/// Toolpath pipeline for one configuration
///
/// Every stage is built and validated up front, so a pipeline that was
/// created successfully only fails at run time on a missing reference
/// document or a sampler error.
#[derive(Debug, Clone)]
pub struct BrushPipeline {
    config: BrushConfig,
    pub(crate) merger: StrokeMerger,
    pub(crate) resampler: Resampler,
    pub(crate) smoother: Smoother,
    pub(crate) profile: PressureProfile,
    pub(crate) range: ZRange,
    emitter: MotionEmitter,
}

impl BrushPipeline {
    /// Validate the configuration and build every stage
    pub fn new(config: BrushConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            merger: StrokeMerger::new(config.merge_tolerance)?,
            resampler: Resampler::new(config.segment_length)?,
            smoother: Smoother::new(config.z_smooth_distance)?,
            profile: PressureProfile::from_config(&config)?,
            range: ZRange::from_config(&config),
            emitter: MotionEmitter::from_config(&config)?,
            config,
        })
    }

    pub fn config(&self) -> &BrushConfig {
        &self.config
    }

    /// Pressure mode after precedence
    pub fn mode(&self) -> PressureMode {
        self.profile.mode()
    }

    pub fn emitter(&self) -> &MotionEmitter {
        &self.emitter
    }

    /// Whether strokes of this run are smoothed
    pub fn smooths(&self) -> bool {
        !self.smoother.is_identity()
            && (self.mode() == PressureMode::Spatial || self.config.smooth_all_modes)
    }

    /// Index a reference document with this run's alignment settings
    pub fn build_reference_index(&self, document: &ReferenceDocument) -> Result<SpatialColorIndex> {
        let mut index = SpatialColorIndex::from_document(document)?;
        if self.config.align_to_reference_bounds {
            index = index.aligned_to_bounds();
        }
        let offset = index.offset() + DVec2::from(self.config.reference_offset);
        Ok(index.with_offset(offset))
    }

    /// Turn layers into toolpaths
    ///
    /// Spatial mode needs `reference`; without it the run fails before any
    /// stroke is processed. Degenerate strokes are skipped and counted, any
    /// other error aborts the run.
    pub fn run(
        &self,
        layers: &[Layer],
        reference: Option<&SpatialColorIndex>,
    ) -> Result<ToolpathProgram> {
        let layer_sampler = LayerColorSampler;
        let sampler: &dyn ColorSampler = match (self.mode(), reference) {
            (_, Some(index)) => index,
            (PressureMode::Spatial, None) => {
                return Err(ToolpathError::ReferenceUnavailable(
                    "spatial pressure mode requires a reference document".to_string(),
                ));
            }
            (_, None) => &layer_sampler,
        };
        let engine = PressureEngine::new(self.profile, self.range, sampler);

        info!(
            "Running {:?} pressure over {} layers (smoothing {})",
            self.mode(),
            layers.len(),
            if self.smooths() { "on" } else { "off" }
        );

        let mut toolpaths = Vec::new();
        let mut summaries = Vec::with_capacity(layers.len());
        for layer in layers {
            let (layer_paths, summary) = self.run_layer(&engine, layer)?;
            toolpaths.extend(layer_paths);
            summaries.push(summary);
        }

        let program = ToolpathProgram {
            mode: self.mode(),
            toolpaths,
            layers: summaries,
        };
        info!(
            "Built {} toolpaths ({} points, {} strokes skipped)",
            program.toolpaths.len(),
            program.point_count(),
            program.skipped_strokes()
        );
        Ok(program)
    }

    /// Run and emit G-code in one step
    pub fn run_to_gcode(
        &self,
        layers: &[Layer],
        reference: Option<&SpatialColorIndex>,
    ) -> Result<String> {
        let program = self.run(layers, reference)?;
        Ok(self.emitter.emit_program(&program))
    }

    fn run_layer(
        &self,
        engine: &PressureEngine<'_>,
        layer: &Layer,
    ) -> Result<(Vec<Toolpath>, LayerSummary)> {
        let merged = self.merger.merge(&layer.strokes);
        if merged.len() < layer.strokes.len() {
            info!(
                "Layer {}: merged {} lines into {} strokes",
                layer.id,
                layer.strokes.len(),
                merged.len()
            );
        }

        let plan = engine.prepare_layer(layer);
        let results = self.process_strokes(engine, &plan, &merged);

        let mut toolpaths = Vec::with_capacity(merged.len());
        let mut skipped = 0;
        for (index, result) in results.into_iter().enumerate() {
            match result {
                Ok(points) => toolpaths.push(Toolpath {
                    layer_id: layer.id,
                    points,
                }),
                Err(err) if err.is_recoverable() => {
                    warn!("Skipping stroke {} of layer {}: {}", index, layer.id, err);
                    skipped += 1;
                }
                Err(err) => return Err(err),
            }
        }

        debug!(
            "Layer {}: {} toolpaths, {} skipped",
            layer.id,
            toolpaths.len(),
            skipped
        );
        let summary = LayerSummary {
            layer_id: layer.id,
            input_strokes: layer.strokes.len(),
            merged_strokes: merged.len(),
            skipped_strokes: skipped,
        };
        Ok((toolpaths, summary))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::ReferencePath;
    use crate::types::{Rgb, Stroke};

    const EPSILON: f64 = 1e-9;

    fn config() -> BrushConfig {
        BrushConfig {
            merge_tolerance: 1.0,
            segment_length: 2.0,
            z_smooth_distance: 0.0,
            ..BrushConfig::default()
        }
    }

    fn line(x0: f64, y0: f64, x1: f64, y1: f64) -> Stroke {
        Stroke::from_xy(&[(x0, y0), (x1, y1)])
    }

    #[test]
    fn test_invalid_config_rejected() {
        let result = BrushPipeline::new(BrushConfig {
            segment_length: 0.0,
            ..config()
        });
        assert!(matches!(
            result,
            Err(ToolpathError::InvalidParameter {
                name: "segment_length",
                ..
            })
        ));
    }

    #[test]
    fn test_position_run_end_to_end() {
        let pipeline = BrushPipeline::new(config()).unwrap();
        let layers = vec![Layer::new(0).with_strokes(vec![line(0.0, 0.0, 100.0, 0.0)])];
        let program = pipeline.run(&layers, None).unwrap();

        assert_eq!(program.mode, PressureMode::Position);
        assert_eq!(program.toolpaths.len(), 1);
        let points = &program.toolpaths[0].points;
        assert_eq!(points.len(), 51);
        assert!((points[0].z + 3.0).abs() < EPSILON);
        assert!((points[25].z + 20.0).abs() < 1e-6);
        assert!((points[50].z + 3.0).abs() < EPSILON);
    }

    #[test]
    fn test_merge_then_process() {
        let pipeline = BrushPipeline::new(config()).unwrap();
        let layers = vec![Layer::new(7).with_strokes(vec![
            line(0.0, 0.0, 10.0, 0.0),
            line(30.0, 0.0, 20.0, 0.0),
            line(10.5, 0.0, 20.0, 0.0),
        ])];
        let program = pipeline.run(&layers, None).unwrap();

        assert_eq!(program.toolpaths.len(), 1);
        assert_eq!(
            program.layers,
            vec![LayerSummary {
                layer_id: 7,
                input_strokes: 3,
                merged_strokes: 1,
                skipped_strokes: 0,
            }]
        );
        let points = &program.toolpaths[0].points;
        assert_eq!(points.first().unwrap().position, DVec2::new(0.0, 0.0));
        assert_eq!(points.last().unwrap().position, DVec2::new(30.0, 0.0));
    }

    #[test]
    fn test_degenerate_strokes_skipped() {
        let pipeline = BrushPipeline::new(BrushConfig {
            merge_tolerance: 0.0,
            ..config()
        })
        .unwrap();
        let layers = vec![Layer::new(1).with_strokes(vec![
            line(0.0, 0.0, 10.0, 0.0),
            Stroke::from_xy(&[(50.0, 50.0)]),
            line(0.0, 5.0, 10.0, 5.0),
        ])];
        let program = pipeline.run(&layers, None).unwrap();

        assert_eq!(program.toolpaths.len(), 2);
        assert_eq!(program.skipped_strokes(), 1);
        // Order of the surviving strokes is kept
        assert_eq!(program.toolpaths[1].points[0].position, DVec2::new(0.0, 5.0));
    }

    #[test]
    fn test_spatial_without_reference_fails_early() {
        let pipeline = BrushPipeline::new(BrushConfig {
            z_from_reference: true,
            ..config()
        })
        .unwrap();
        let layers = vec![Layer::new(0).with_strokes(vec![line(0.0, 0.0, 10.0, 0.0)])];
        assert!(matches!(
            pipeline.run(&layers, None),
            Err(ToolpathError::ReferenceUnavailable(_))
        ));
    }

    #[test]
    fn test_spatial_run_with_reference() {
        let pipeline = BrushPipeline::new(BrushConfig {
            mode: PressureMode::Spatial,
            z_smooth_distance: 5.0,
            ..config()
        })
        .unwrap();
        assert!(pipeline.smooths());

        let document = ReferenceDocument {
            paths: vec![ReferencePath {
                points: vec![DVec2::new(-50.0, 0.0), DVec2::new(150.0, 0.0)],
                color: Some(Rgb::BLACK),
            }],
        };
        let index = pipeline.build_reference_index(&document).unwrap();
        let layers = vec![Layer::new(0).with_strokes(vec![line(0.0, 1.0, 40.0, 1.0)])];
        let program = pipeline.run(&layers, Some(&index)).unwrap();

        // Uniformly black reference: full depth everywhere, ends included
        for point in &program.toolpaths[0].points {
            assert!((point.z + 20.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_reference_offset_and_alignment() {
        let document = ReferenceDocument {
            paths: vec![ReferencePath {
                points: vec![DVec2::new(100.0, 200.0), DVec2::new(110.0, 200.0)],
                color: Some(Rgb::BLACK),
            }],
        };
        let pipeline = BrushPipeline::new(BrushConfig {
            align_to_reference_bounds: true,
            reference_offset: [1.0, -2.0],
            ..config()
        })
        .unwrap();
        let index = pipeline.build_reference_index(&document).unwrap();
        assert_eq!(index.offset(), DVec2::new(101.0, 198.0));
    }

    #[test]
    fn test_layer_color_run_uses_layer_colors() {
        let pipeline = BrushPipeline::new(BrushConfig {
            z_from_color: true,
            ..config()
        })
        .unwrap();
        let layers = vec![
            Layer::new(0)
                .with_color(Rgb::WHITE)
                .with_strokes(vec![line(0.0, 0.0, 200.0, 0.0)]),
            Layer::new(1).with_strokes(vec![line(0.0, 9.0, 200.0, 9.0)]),
        ];
        let program = pipeline.run(&layers, None).unwrap();

        let hold = |toolpath: &Toolpath| toolpath.points[50].z;
        assert!((hold(&program.toolpaths[0]) + 3.0).abs() < EPSILON);
        assert!((hold(&program.toolpaths[1]) + 20.0).abs() < EPSILON);
    }

    #[test]
    fn test_run_to_gcode() {
        let pipeline = BrushPipeline::new(config()).unwrap();
        let layers = vec![Layer::new(2).with_strokes(vec![
            line(0.0, 0.0, 10.0, 0.0),
            line(10.0, 0.0, 20.0, 0.0),
        ])];
        let gcode = pipeline.run_to_gcode(&layers, None).unwrap();

        assert!(gcode.contains("; Layer 2\n; Merged 2 lines into 1 strokes\n"));
        assert_eq!(gcode.matches("G0 X").count(), 1);
        assert!(gcode.ends_with("M2\n"));
    }

    #[test]
    fn test_empty_document() {
        let pipeline = BrushPipeline::new(config()).unwrap();
        let program = pipeline.run(&[], None).unwrap();
        assert!(program.is_empty());
        assert!(program.layers.is_empty());
    }
}
