//! Z curves along resampled strokes
//!
//! The pressure mode is resolved once per run into a [`PressureProfile`].
//! Each layer is then turned into a [`LayerPlan`] (the layer color is looked
//! up once), and the plan is applied point by point.
//!
//! Envelope modes follow Travel -> Press -> Hold -> Lift -> Travel. When a
//! stroke is shorter than `press + lift` both phases shrink proportionally so
//! they meet in the middle.

use brushpath_config::{BrushConfig, PressureMode};
use tracing::debug;

use crate::color::ColorSampler;
use crate::error::Result;
use crate::types::{ArcLengthPoint, ColorSample, Layer, PressurePoint};

/// Linear interpolation that lands exactly on both ends
fn lerp(from: f64, to: f64, t: f64) -> f64 {
    from * (1.0 - t) + to * t
}

/// Tool heights for a run (mm)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZRange {
    /// Z at zero pressure
    pub z_up: f64,
    /// Z at full pressure
    pub z_down: f64,
    /// Z for travel moves
    pub z_travel: f64,
}

impl ZRange {
    pub fn from_config(config: &BrushConfig) -> Self {
        Self {
            z_up: config.z_up,
            z_down: config.z_down,
            z_travel: config.effective_z_travel(),
        }
    }

    /// Z for a pressure sample: `z_up` at 0, `z_down` at 1
    pub fn at_pressure(&self, sample: ColorSample) -> f64 {
        lerp(self.z_up, self.z_down, sample.value())
    }
}

/// Press and lift phase lengths (mm)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Envelope {
    pub press: f64,
    pub lift: f64,
}

impl Envelope {
    pub fn new(press: f64, lift: f64) -> Result<Self> {
        brushpath_config::non_negative("press_distance", press)?;
        brushpath_config::non_negative("lift_distance", lift)?;
        Ok(Self { press, lift })
    }

    /// Phases for a stroke of `length`, scaled down to fit if needed
    ///
    /// The press:lift ratio is preserved and the scaled phases sum to
    /// exactly `length`.
    pub fn fit(&self, length: f64) -> Envelope {
        let total = self.press + self.lift;
        if total <= length || total <= 0.0 {
            return *self;
        }
        let press = self.press * (length / total);
        Envelope {
            press,
            lift: length - press,
        }
    }

    /// Z at arc length `distance` of a stroke of `length`
    ///
    /// Expects an envelope already fitted to `length`. Zero-length phases
    /// are instantaneous: without a press phase the stroke starts in hold,
    /// without a lift phase the last point jumps back to `z_edge`.
    pub fn z_at(&self, distance: f64, length: f64, z_edge: f64, z_interior: f64) -> f64 {
        let hold_end = length - self.lift;
        if distance < self.press {
            lerp(z_edge, z_interior, distance / self.press)
        } else if distance < hold_end {
            z_interior
        } else if self.lift > 0.0 {
            lerp(z_interior, z_edge, ((distance - hold_end) / self.lift).clamp(0.0, 1.0))
        } else {
            z_edge
        }
    }
}

/// Pressure mode resolved from configuration
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PressureProfile {
    /// Envelope between `z_up` and `z_down`
    Position(Envelope),
    /// Envelope between `z_travel` and the layer color's depth
    LayerColor(Envelope),
    /// Per-point depth from the reference document, no envelope
    Spatial,
}

impl PressureProfile {
    pub fn from_config(config: &BrushConfig) -> Result<Self> {
        let envelope = Envelope::new(config.press_distance, config.lift_distance)?;
        Ok(match config.resolved_mode() {
            PressureMode::Position => PressureProfile::Position(envelope),
            PressureMode::LayerColor => PressureProfile::LayerColor(envelope),
            PressureMode::Spatial => PressureProfile::Spatial,
        })
    }

    pub fn mode(&self) -> PressureMode {
        match self {
            PressureProfile::Position(_) => PressureMode::Position,
            PressureProfile::LayerColor(_) => PressureMode::LayerColor,
            PressureProfile::Spatial => PressureMode::Spatial,
        }
    }
}

/// Per-layer pressure parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LayerPlan {
    Envelope {
        envelope: Envelope,
        /// Z at the stroke ends
        z_edge: f64,
        /// Z while holding
        z_interior: f64,
    },
    Spatial,
}

/// Computes Z for every resampled point of a stroke
#[derive(Clone, Copy)]
pub struct PressureEngine<'a> {
    profile: PressureProfile,
    range: ZRange,
    sampler: &'a dyn ColorSampler,
}

impl<'a> PressureEngine<'a> {
    pub fn new(profile: PressureProfile, range: ZRange, sampler: &'a dyn ColorSampler) -> Self {
        Self {
            profile,
            range,
            sampler,
        }
    }

    pub fn profile(&self) -> PressureProfile {
        self.profile
    }

    pub fn range(&self) -> ZRange {
        self.range
    }

    /// Resolve everything that is constant across a layer
    pub fn prepare_layer(&self, layer: &Layer) -> LayerPlan {
        match self.profile {
            PressureProfile::Position(envelope) => LayerPlan::Envelope {
                envelope,
                z_edge: self.range.z_up,
                z_interior: self.range.z_down,
            },
            PressureProfile::LayerColor(envelope) => {
                let sample = self.sampler.layer_color(layer);
                let z_interior = self.range.at_pressure(sample);
                debug!(
                    "Layer {} pressure {:.3}, interior Z {:.3}",
                    layer.id,
                    sample.value(),
                    z_interior
                );
                LayerPlan::Envelope {
                    envelope,
                    z_edge: self.range.z_travel,
                    z_interior,
                }
            }
            PressureProfile::Spatial => LayerPlan::Spatial,
        }
    }

    /// Z values for one resampled stroke
    ///
    /// Spatial plans fail with `ReferenceUnavailable` if the sampler has no
    /// reference document.
    pub fn apply(&self, plan: &LayerPlan, points: &[ArcLengthPoint]) -> Result<Vec<PressurePoint>> {
        let Some(length) = points.last().map(|p| p.length) else {
            return Ok(Vec::new());
        };

        match *plan {
            LayerPlan::Envelope {
                envelope,
                z_edge,
                z_interior,
            } => {
                let fitted = envelope.fit(length);
                Ok(points
                    .iter()
                    .map(|p| {
                        let z = fitted.z_at(p.distance, length, z_edge, z_interior);
                        PressurePoint::new(p, z)
                    })
                    .collect())
            }
            LayerPlan::Spatial => points
                .iter()
                .map(|p| {
                    let sample = self.sampler.spatial_color(p.position)?;
                    Ok(PressurePoint::new(p, self.range.at_pressure(sample)))
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use glam::DVec2;

    use super::*;
    use crate::color::{LayerColorSampler, SpatialColorIndex};
    use crate::error::ToolpathError;
    use crate::reference::{ReferenceDocument, ReferencePath};
    use crate::types::Rgb;

    const EPSILON: f64 = 1e-9;

    /// Straight stroke along X with exact arc lengths
    fn straight(length: f64, spacing: f64) -> Vec<ArcLengthPoint> {
        let steps = (length / spacing).round() as usize;
        (0..=steps)
            .map(|i| {
                let d = i as f64 * spacing;
                ArcLengthPoint {
                    position: DVec2::new(d, 0.0),
                    distance: d,
                    length,
                }
            })
            .collect()
    }

    fn range() -> ZRange {
        ZRange {
            z_up: -3.0,
            z_down: -20.0,
            z_travel: -3.0,
        }
    }

    fn position_engine(sampler: &dyn ColorSampler) -> PressureEngine<'_> {
        let envelope = Envelope::new(50.0, 50.0).unwrap();
        PressureEngine::new(PressureProfile::Position(envelope), range(), sampler)
    }

    fn z_at(points: &[PressurePoint], distance: f64) -> f64 {
        points
            .iter()
            .find(|p| (p.distance - distance).abs() < EPSILON)
            .map(|p| p.z)
            .unwrap()
    }

    #[test]
    fn test_long_stroke_envelope() {
        let sampler = LayerColorSampler;
        let engine = position_engine(&sampler);
        let plan = engine.prepare_layer(&Layer::new(0));
        let points = engine.apply(&plan, &straight(100.0, 2.0)).unwrap();

        assert_eq!(points.len(), 51);
        assert!((z_at(&points, 0.0) + 3.0).abs() < EPSILON);
        assert!((z_at(&points, 50.0) + 20.0).abs() < EPSILON);
        assert!((z_at(&points, 100.0) + 3.0).abs() < EPSILON);
        // Samples fall on even distances; 24 mm is 48% through the press
        assert!((z_at(&points, 24.0) + 11.16).abs() < 1e-9);
    }

    #[test]
    fn test_short_stroke_scaling() {
        let sampler = LayerColorSampler;
        let engine = position_engine(&sampler);
        let plan = engine.prepare_layer(&Layer::new(0));
        let points = engine.apply(&plan, &straight(20.0, 2.0)).unwrap();

        assert!((z_at(&points, 0.0) + 3.0).abs() < EPSILON);
        assert!((z_at(&points, 10.0) + 20.0).abs() < EPSILON);
        assert!((z_at(&points, 20.0) + 3.0).abs() < EPSILON);
    }

    #[test]
    fn test_fit_preserves_ratio() {
        let fitted = Envelope::new(30.0, 10.0).unwrap().fit(20.0);
        assert!((fitted.press + fitted.lift - 20.0).abs() < EPSILON);
        assert!((fitted.press / fitted.lift - 3.0).abs() < EPSILON);

        let roomy = Envelope::new(30.0, 10.0).unwrap().fit(100.0);
        assert_eq!(roomy, Envelope::new(30.0, 10.0).unwrap());
    }

    #[test]
    fn test_hold_region_at_full_depth() {
        let envelope = Envelope::new(10.0, 20.0).unwrap().fit(100.0);
        for d in [10.0, 30.0, 60.0, 79.9] {
            assert_eq!(envelope.z_at(d, 100.0, -3.0, -20.0), -20.0);
        }
        assert!(envelope.z_at(5.0, 100.0, -3.0, -20.0) > -20.0);
        assert!(envelope.z_at(90.0, 100.0, -3.0, -20.0) > -20.0);
    }

    #[test]
    fn test_zero_length_phases() {
        let envelope = Envelope::new(0.0, 0.0).unwrap();
        assert_eq!(envelope.z_at(0.0, 10.0, -3.0, -20.0), -20.0);
        assert_eq!(envelope.z_at(5.0, 10.0, -3.0, -20.0), -20.0);
        assert_eq!(envelope.z_at(10.0, 10.0, -3.0, -20.0), -3.0);
    }

    #[test]
    fn test_negative_phase_rejected() {
        assert!(matches!(
            Envelope::new(-1.0, 5.0),
            Err(ToolpathError::InvalidParameter {
                name: "press_distance",
                ..
            })
        ));
    }

    #[test]
    fn test_layer_color_blends_from_travel() {
        let sampler = LayerColorSampler;
        let envelope = Envelope::new(10.0, 10.0).unwrap();
        let range = ZRange {
            z_up: -3.0,
            z_down: -20.0,
            z_travel: 0.0,
        };
        let engine = PressureEngine::new(PressureProfile::LayerColor(envelope), range, &sampler);

        // Pure red: luminance 0.299
        let layer = Layer::new(3).with_color(Rgb::new(255, 0, 0));
        let plan = engine.prepare_layer(&layer);
        let points = engine.apply(&plan, &straight(40.0, 2.0)).unwrap();

        let interior = -3.0 + (1.0 - 0.299) * -17.0;
        assert!(z_at(&points, 0.0).abs() < EPSILON);
        assert!((z_at(&points, 20.0) - interior).abs() < 1e-6);
        assert!(z_at(&points, 40.0).abs() < EPSILON);
    }

    #[test]
    fn test_white_layer_stays_up() {
        let sampler = LayerColorSampler;
        let envelope = Envelope::new(10.0, 10.0).unwrap();
        let engine = PressureEngine::new(PressureProfile::LayerColor(envelope), range(), &sampler);
        let plan = engine.prepare_layer(&Layer::new(0).with_color(Rgb::WHITE));
        let points = engine.apply(&plan, &straight(40.0, 2.0)).unwrap();
        assert!(points.iter().all(|p| (p.z + 3.0).abs() < EPSILON));
    }

    #[test]
    fn test_spatial_has_no_envelope() {
        let document = ReferenceDocument {
            paths: vec![ReferencePath {
                points: vec![DVec2::new(-10.0, 1.0), DVec2::new(110.0, 1.0)],
                color: Some(Rgb::BLACK),
            }],
        };
        let index = SpatialColorIndex::from_document(&document).unwrap();
        let engine = PressureEngine::new(PressureProfile::Spatial, range(), &index);
        let plan = engine.prepare_layer(&Layer::new(0));
        let points = engine.apply(&plan, &straight(100.0, 2.0)).unwrap();

        // Full pressure from the first point to the last
        assert!(points.iter().all(|p| (p.z + 20.0).abs() < EPSILON));
    }

    #[test]
    fn test_spatial_without_reference_fails() {
        let sampler = LayerColorSampler;
        let engine = PressureEngine::new(PressureProfile::Spatial, range(), &sampler);
        let plan = engine.prepare_layer(&Layer::new(0));
        let result = engine.apply(&plan, &straight(10.0, 2.0));
        assert!(matches!(result, Err(ToolpathError::ReferenceUnavailable(_))));
    }

    #[test]
    fn test_profile_from_config_precedence() {
        let config = BrushConfig {
            z_from_color: true,
            ..BrushConfig::default()
        };
        let profile = PressureProfile::from_config(&config).unwrap();
        assert_eq!(profile.mode(), PressureMode::LayerColor);

        let config = BrushConfig {
            mode: PressureMode::LayerColor,
            z_from_reference: true,
            ..BrushConfig::default()
        };
        assert_eq!(
            PressureProfile::from_config(&config).unwrap(),
            PressureProfile::Spatial
        );
    }
}
