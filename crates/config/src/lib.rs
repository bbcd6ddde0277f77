//! Shared configuration for brushpath
//!
//! This crate provides the single source of truth for the pressure curve,
//! resampling, merging and motion output settings consumed by the
//! `toolpath` pipeline. It is populated by whatever front end drives the
//! pipeline (command line, JSON file, host application).

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default Z at light/zero pressure (mm)
pub const DEFAULT_Z_UP: f64 = -3.0;

/// Default Z at full pressure (mm)
pub const DEFAULT_Z_DOWN: f64 = -20.0;

/// Default press-down distance at stroke start (mm)
pub const DEFAULT_PRESS_DISTANCE: f64 = 50.0;

/// Default lift distance at stroke end (mm)
pub const DEFAULT_LIFT_DISTANCE: f64 = 50.0;

/// Default endpoint tolerance for stroke merging (mm)
pub const DEFAULT_MERGE_TOLERANCE: f64 = 1.0;

/// Default resampling spacing (mm)
pub const DEFAULT_SEGMENT_LENGTH: f64 = 2.0;

/// Default Gaussian smoothing radius (mm)
pub const DEFAULT_Z_SMOOTH_DISTANCE: f64 = 5.0;

/// Default drawing feed rate (output unit per minute)
pub const DEFAULT_FEED_RATE: f64 = 1000.0;

/// Millimeters per inch
pub const MM_PER_INCH: f64 = 25.4;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid parameter `{name}` = {value}: {reason}")]
    InvalidParameter {
        name: &'static str,
        value: f64,
        reason: &'static str,
    },
    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

/// How Z is derived along a stroke.
///
/// Variants are ordered by precedence: when several are requested the
/// greatest one wins (`Spatial > LayerColor > Position`).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum PressureMode {
    /// Press/hold/lift envelope from position along the stroke
    #[default]
    Position,
    /// Interior depth from the layer's assigned color
    LayerColor,
    /// Per-point depth from the nearest path in a reference document
    Spatial,
}

/// Unit used for emitted coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputUnit {
    #[default]
    Mm,
    Cm,
    In,
}

impl OutputUnit {
    /// Number of output units in one millimeter
    pub fn per_mm(self) -> f64 {
        match self {
            OutputUnit::Mm => 1.0,
            OutputUnit::Cm => 0.1,
            OutputUnit::In => 1.0 / MM_PER_INCH,
        }
    }

    /// Convert a millimeter value to this unit
    pub fn convert_mm(self, value: f64) -> f64 {
        value * self.per_mm()
    }

    pub fn name(self) -> &'static str {
        match self {
            OutputUnit::Mm => "mm",
            OutputUnit::Cm => "cm",
            OutputUnit::In => "in",
        }
    }
}

/// Brush pressure configuration for one pipeline run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrushConfig {
    /// Z at light/zero pressure (mm)
    pub z_up: f64,
    /// Z at full pressure (mm)
    pub z_down: f64,
    /// Z during travel moves (mm); falls back to `z_up`
    pub z_travel: Option<f64>,
    /// Requested pressure mode
    pub mode: PressureMode,
    /// Also request layer-color mode
    pub z_from_color: bool,
    /// Also request spatial mode
    pub z_from_reference: bool,
    /// Press-down distance at stroke start (mm)
    pub press_distance: f64,
    /// Lift distance at stroke end (mm)
    pub lift_distance: f64,
    /// Endpoint merge tolerance (mm); 0 disables merging
    pub merge_tolerance: f64,
    /// Resampling spacing (mm)
    pub segment_length: f64,
    /// Gaussian smoothing radius (mm); 0 disables smoothing
    pub z_smooth_distance: f64,
    /// Smooth envelope modes too, not only spatial mode
    pub smooth_all_modes: bool,
    /// Drawing feed rate (output unit per minute)
    pub feed_rate: f64,
    /// Unit of emitted coordinates
    pub output_unit: OutputUnit,
    /// Offset added to working points before reference lookups (mm)
    pub reference_offset: [f64; 2],
    /// Offset reference lookups by the reference document's minimum bounds
    pub align_to_reference_bounds: bool,
}

impl Default for BrushConfig {
    fn default() -> Self {
        Self {
            z_up: DEFAULT_Z_UP,
            z_down: DEFAULT_Z_DOWN,
            z_travel: None,
            mode: PressureMode::default(),
            z_from_color: false,
            z_from_reference: false,
            press_distance: DEFAULT_PRESS_DISTANCE,
            lift_distance: DEFAULT_LIFT_DISTANCE,
            merge_tolerance: DEFAULT_MERGE_TOLERANCE,
            segment_length: DEFAULT_SEGMENT_LENGTH,
            z_smooth_distance: DEFAULT_Z_SMOOTH_DISTANCE,
            smooth_all_modes: false,
            feed_rate: DEFAULT_FEED_RATE,
            output_unit: OutputUnit::default(),
            reference_offset: [0.0, 0.0],
            align_to_reference_bounds: false,
        }
    }
}

impl BrushConfig {
    /// Parse a configuration from JSON; missing fields take their defaults
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: BrushConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Z used for travel moves
    pub fn effective_z_travel(&self) -> f64 {
        self.z_travel.unwrap_or(self.z_up)
    }

    /// Mode after applying precedence over `mode` and the request flags
    pub fn resolved_mode(&self) -> PressureMode {
        let mut mode = self.mode;
        if self.z_from_color {
            mode = mode.max(PressureMode::LayerColor);
        }
        if self.z_from_reference {
            mode = mode.max(PressureMode::Spatial);
        }
        mode
    }

    /// Check every numeric parameter, reporting the first offender
    pub fn validate(&self) -> Result<(), ConfigError> {
        let coordinates = [
            ("z_up", self.z_up),
            ("z_down", self.z_down),
            ("z_travel", self.effective_z_travel()),
            ("reference_offset.x", self.reference_offset[0]),
            ("reference_offset.y", self.reference_offset[1]),
        ];
        for (name, value) in coordinates {
            finite(name, value)?;
        }

        non_negative("press_distance", self.press_distance)?;
        non_negative("lift_distance", self.lift_distance)?;
        non_negative("merge_tolerance", self.merge_tolerance)?;
        non_negative("z_smooth_distance", self.z_smooth_distance)?;
        positive("segment_length", self.segment_length)?;
        positive("feed_rate", self.feed_rate)?;
        Ok(())
    }
}

/// Check that a parameter is a finite number
pub fn finite(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if !value.is_finite() {
        return Err(ConfigError::InvalidParameter {
            name,
            value,
            reason: "must be finite",
        });
    }
    Ok(())
}

/// Check that a distance parameter is finite and non-negative
pub fn non_negative(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if !value.is_finite() || value < 0.0 {
        return Err(ConfigError::InvalidParameter {
            name,
            value,
            reason: "must be a finite value >= 0",
        });
    }
    Ok(())
}

/// Check that a parameter is finite and strictly positive
pub fn positive(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(ConfigError::InvalidParameter {
            name,
            value,
            reason: "must be a finite value > 0",
        });
    }
    Ok(())
}
