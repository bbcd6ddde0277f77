//! brushpath toolpath system - pressure-modulated plotter toolpaths
//!
//! This crate turns 2D stroke artwork into 3D toolpaths for a brush plotter:
//! - [`types`] - strokes, layers and per-point toolpath data
//! - [`merge`] - joins strokes with touching endpoints
//! - [`resample`] - uniform arc-length resampling
//! - [`color`] - layer and reference-document color sampling
//! - [`pressure`] - Z envelopes and per-point pressure
//! - [`smooth`] - Gaussian smoothing of Z along a stroke
//! - [`emit`] - G-code output
//! - [`reference`] - SVG reference documents for spatial pressure
//! - [`pipeline`] - complete per-document pipeline

pub mod color;
pub mod constants;
pub mod emit;
pub mod error;
pub mod grid;
pub mod merge;
pub mod pipeline;
pub mod pressure;
pub mod reference;
pub mod resample;
pub mod smooth;
pub mod types;

pub use brushpath_config::{BrushConfig, ConfigError, OutputUnit, PressureMode};
pub use color::{ColorSampler, LayerColorSampler, SpatialColorIndex};
pub use emit::MotionEmitter;
pub use error::{Result, ToolpathError};
pub use merge::StrokeMerger;
pub use pipeline::{BrushPipeline, LayerSummary, ToolpathProgram};
pub use pressure::{Envelope, LayerPlan, PressureEngine, PressureProfile, ZRange};
pub use reference::{parse_svg, ReferenceDocument, ReferenceError, ReferencePath};
pub use resample::Resampler;
pub use smooth::Smoother;
pub use types::*;
