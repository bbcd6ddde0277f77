//! Pipeline results

use brushpath_config::PressureMode;
use serde::{Deserialize, Serialize};

use crate::types::Toolpath;

/// What happened to one layer during a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerSummary {
    pub layer_id: u32,
    /// Strokes handed to the merger
    pub input_strokes: usize,
    /// Strokes left after merging
    pub merged_strokes: usize,
    /// Merged strokes dropped as degenerate
    pub skipped_strokes: usize,
}

/// Toolpaths for a whole document plus a per-layer report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolpathProgram {
    /// Pressure mode the run used
    pub mode: PressureMode,
    /// Toolpaths in layer order, then stroke order within each layer
    pub toolpaths: Vec<Toolpath>,
    pub layers: Vec<LayerSummary>,
}

impl ToolpathProgram {
    pub fn skipped_strokes(&self) -> usize {
        self.layers.iter().map(|layer| layer.skipped_strokes).sum()
    }

    pub fn point_count(&self) -> usize {
        self.toolpaths.iter().map(|toolpath| toolpath.points.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.toolpaths.is_empty()
    }
}
