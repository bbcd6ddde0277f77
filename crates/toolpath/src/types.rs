use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::constants::{LUMA_WEIGHTS, POINT_EPSILON};

/// 8-bit RGB color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Perceptual luminance in [0, 1] (0 = black, 1 = white)
    pub fn luminance(self) -> f64 {
        // Integer weights keep black and white exactly at 0 and 1
        let [wr, wg, wb] = LUMA_WEIGHTS;
        let weighted = wr * self.r as u32 + wg * self.g as u32 + wb * self.b as u32;
        weighted as f64 / (1000.0 * 255.0)
    }
}

/// Grayscale pressure value in [0, 1]
///
/// 0 is the lightest color and the least pressure, 1 is the darkest color
/// and full pressure.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize, Default)]
pub struct ColorSample(f64);

impl ColorSample {
    pub const LIGHTEST: ColorSample = ColorSample(0.0);
    pub const DARKEST: ColorSample = ColorSample(1.0);

    /// Create a sample, clamping into [0, 1] (NaN maps to 0)
    pub fn new(value: f64) -> Self {
        if value.is_nan() {
            return Self::LIGHTEST;
        }
        Self(value.clamp(0.0, 1.0))
    }

    /// Sample for an RGB color: dark colors press harder
    pub fn from_rgb(color: Rgb) -> Self {
        Self::new(1.0 - color.luminance())
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

/// A single continuous drawn path, in draw order (mm)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Stroke {
    pub points: Vec<DVec2>,
}

impl Stroke {
    pub fn new(points: Vec<DVec2>) -> Self {
        Self { points }
    }

    /// Build a stroke from (x, y) pairs
    pub fn from_xy(points: &[(f64, f64)]) -> Self {
        Self::new(points.iter().map(|&(x, y)| DVec2::new(x, y)).collect())
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> Option<DVec2> {
        self.points.first().copied()
    }

    pub fn last(&self) -> Option<DVec2> {
        self.points.last().copied()
    }

    /// Total polyline length
    pub fn length(&self) -> f64 {
        self.points.windows(2).map(|w| w[0].distance(w[1])).sum()
    }

    /// Whether the stroke ends where it starts
    pub fn is_closed(&self) -> bool {
        match (self.first(), self.last()) {
            (Some(first), Some(last)) => {
                self.points.len() > 2 && first.distance(last) <= POINT_EPSILON
            }
            _ => false,
        }
    }

    /// The same path drawn in the opposite direction
    pub fn reversed(&self) -> Stroke {
        Stroke::new(self.points.iter().rev().copied().collect())
    }
}

/// A group of strokes sharing a color and a merge scope
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Layer {
    pub id: u32,
    /// Assigned color; unset layers draw as black
    pub color: Option<Rgb>,
    pub strokes: Vec<Stroke>,
}

impl Layer {
    pub fn new(id: u32) -> Self {
        Self {
            id,
            color: None,
            strokes: Vec::new(),
        }
    }

    pub fn with_color(mut self, color: Rgb) -> Self {
        self.color = Some(color);
        self
    }

    pub fn with_strokes(mut self, strokes: Vec<Stroke>) -> Self {
        self.strokes = strokes;
        self
    }

    pub fn color_or_default(&self) -> Rgb {
        self.color.unwrap_or(Rgb::BLACK)
    }
}

/// A resampled point tagged with its arc length
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArcLengthPoint {
    pub position: DVec2,
    /// Distance along the stroke from its first point
    pub distance: f64,
    /// Total stroke length
    pub length: f64,
}

/// A resampled point with its Z height
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PressurePoint {
    pub position: DVec2,
    pub distance: f64,
    pub length: f64,
    /// Tool height (mm)
    pub z: f64,
    /// Feed rate for the move into this point, overriding the program feed
    pub feed_rate: Option<f64>,
}

impl PressurePoint {
    pub fn new(point: &ArcLengthPoint, z: f64) -> Self {
        Self {
            position: point.position,
            distance: point.distance,
            length: point.length,
            z,
            feed_rate: None,
        }
    }
}

/// A finished stroke ready for emission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Toolpath {
    pub layer_id: u32,
    pub points: Vec<PressurePoint>,
}
