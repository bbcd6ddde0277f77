//! G-code output
//!
//! Each toolpath becomes a rapid to the start at travel height, a plunge to
//! the first point's Z, linear moves through the remaining points and a
//! rapid lift back to travel height.

use brushpath_config::{BrushConfig, OutputUnit};
use tracing::info;

use crate::constants::PROGRAM_NAME;
use crate::error::Result;
use crate::pipeline::{LayerSummary, ToolpathProgram};
use crate::types::Toolpath;

/// Writes toolpaths as G-code text
#[derive(Debug, Clone, Copy)]
pub struct MotionEmitter {
    /// Modal drawing feed (output unit per minute)
    feed_rate: f64,
    unit: OutputUnit,
    /// Travel height (mm)
    z_travel: f64,
}

impl MotionEmitter {
    pub fn new(feed_rate: f64, unit: OutputUnit, z_travel: f64) -> Result<Self> {
        brushpath_config::positive("feed_rate", feed_rate)?;
        brushpath_config::finite("z_travel", z_travel)?;
        Ok(Self {
            feed_rate,
            unit,
            z_travel,
        })
    }

    pub fn from_config(config: &BrushConfig) -> Result<Self> {
        Self::new(
            config.feed_rate,
            config.output_unit,
            config.effective_z_travel(),
        )
    }

    pub fn unit(&self) -> OutputUnit {
        self.unit
    }

    /// G-code for toolpaths in the given order
    pub fn emit(&self, toolpaths: &[Toolpath]) -> String {
        self.render(toolpaths, &[])
    }

    /// G-code for a pipeline result, with per-layer merge notes
    pub fn emit_program(&self, program: &ToolpathProgram) -> String {
        self.render(&program.toolpaths, &program.layers)
    }

    fn render(&self, toolpaths: &[Toolpath], layers: &[LayerSummary]) -> String {
        let mut lines = Vec::new();
        self.header(&mut lines);

        let mut current_layer = None;
        let mut modal_feed = self.feed_rate;
        for toolpath in toolpaths {
            if toolpath.points.is_empty() {
                continue;
            }
            if current_layer != Some(toolpath.layer_id) {
                current_layer = Some(toolpath.layer_id);
                lines.push(format!("; Layer {}", toolpath.layer_id));
                if let Some(summary) = layers
                    .iter()
                    .find(|s| s.layer_id == toolpath.layer_id && s.merged_strokes < s.input_strokes)
                {
                    lines.push(format!(
                        "; Merged {} lines into {} strokes",
                        summary.input_strokes, summary.merged_strokes
                    ));
                }
            }
            self.toolpath(toolpath, &mut modal_feed, &mut lines);
        }

        lines.push("; End of program".to_string());
        lines.push("M2".to_string());

        info!(
            "Emitted {} toolpaths as {} lines of G-code ({})",
            toolpaths.len(),
            lines.len(),
            self.unit.name()
        );

        let mut text = lines.join("\n");
        text.push('\n');
        text
    }

    fn header(&self, lines: &mut Vec<String>) {
        lines.push(format!("; Generated by {PROGRAM_NAME}"));
        match self.unit {
            OutputUnit::Mm => lines.push("G21 ; Set units to millimeters".to_string()),
            OutputUnit::Cm => {
                lines.push("; Coordinates in centimeters".to_string());
                lines.push("G21 ; Set units to millimeters".to_string());
            }
            OutputUnit::In => lines.push("G20 ; Set units to inches".to_string()),
        }
        lines.push("G90 ; Absolute positioning".to_string());
        lines.push(format!("G0 Z{} ; Pen up", self.coordinate(self.z_travel)));
        lines.push(format!("F{:.1} ; Set feed rate", self.feed_rate));
    }

    fn toolpath(&self, toolpath: &Toolpath, modal_feed: &mut f64, lines: &mut Vec<String>) {
        let Some((first, rest)) = toolpath.points.split_first() else {
            return;
        };
        let travel = self.coordinate(self.z_travel);

        lines.push(format!(
            "G0 X{} Y{} Z{}",
            self.coordinate(first.position.x),
            self.coordinate(first.position.y),
            travel
        ));
        lines.push(format!("G0 Z{}", self.coordinate(first.z)));

        for point in rest {
            let mut line = format!(
                "G1 X{} Y{} Z{}",
                self.coordinate(point.position.x),
                self.coordinate(point.position.y),
                self.coordinate(point.z)
            );
            let feed = point.feed_rate.unwrap_or(self.feed_rate);
            if feed != *modal_feed {
                line.push_str(&format!(" F{feed:.1}"));
                *modal_feed = feed;
            }
            lines.push(line);
        }

        lines.push(format!("G0 Z{travel}"));
    }

    /// A millimeter value in the output unit, four decimals, never `-0.0000`
    fn coordinate(&self, mm: f64) -> String {
        let value = self.unit.convert_mm(mm);
        let value = if (value * 1e4).round() == 0.0 { 0.0 } else { value };
        format!("{value:.4}")
    }
}

#[cfg(test)]
mod tests {
    use glam::DVec2;

    use super::*;
    use crate::error::ToolpathError;
    use crate::types::PressurePoint;

    fn point(x: f64, y: f64, z: f64) -> PressurePoint {
        PressurePoint {
            position: DVec2::new(x, y),
            distance: 0.0,
            length: 0.0,
            z,
            feed_rate: None,
        }
    }

    fn toolpath(layer_id: u32, points: Vec<PressurePoint>) -> Toolpath {
        Toolpath { layer_id, points }
    }

    fn emitter() -> MotionEmitter {
        MotionEmitter::new(1000.0, OutputUnit::Mm, -3.0).unwrap()
    }

    #[test]
    fn test_program_structure() {
        let paths = vec![toolpath(
            0,
            vec![point(0.0, 0.0, -3.0), point(2.0, 0.0, -10.0), point(4.0, 0.0, -3.0)],
        )];
        let gcode = emitter().emit(&paths);
        let lines: Vec<&str> = gcode.lines().collect();

        assert_eq!(
            lines,
            vec![
                "; Generated by brushpath",
                "G21 ; Set units to millimeters",
                "G90 ; Absolute positioning",
                "G0 Z-3.0000 ; Pen up",
                "F1000.0 ; Set feed rate",
                "; Layer 0",
                "G0 X0.0000 Y0.0000 Z-3.0000",
                "G0 Z-3.0000",
                "G1 X2.0000 Y0.0000 Z-10.0000",
                "G1 X4.0000 Y0.0000 Z-3.0000",
                "G0 Z-3.0000",
                "; End of program",
                "M2",
            ]
        );
    }

    #[test]
    fn test_inch_output_converts_all_axes() {
        let emitter = MotionEmitter::new(40.0, OutputUnit::In, 0.0).unwrap();
        let gcode = emitter.emit(&[toolpath(
            1,
            vec![point(25.4, 50.8, -25.4), point(0.0, 0.0, -12.7)],
        )]);

        assert!(gcode.contains("G20 ; Set units to inches"));
        assert!(gcode.contains("G0 X1.0000 Y2.0000 Z0.0000"));
        assert!(gcode.contains("G0 Z-1.0000"));
        assert!(gcode.contains("G1 X0.0000 Y0.0000 Z-0.5000"));
        assert!(!gcode.contains("-0.0000"));
    }

    #[test]
    fn test_feed_override_is_modal() {
        let mut slow = point(1.0, 0.0, -5.0);
        slow.feed_rate = Some(200.0);
        let mut still_slow = point(2.0, 0.0, -5.0);
        still_slow.feed_rate = Some(200.0);
        let normal = point(3.0, 0.0, -5.0);

        let gcode = emitter().emit(&[toolpath(0, vec![point(0.0, 0.0, -5.0), slow, still_slow, normal])]);
        let moves: Vec<&str> = gcode.lines().filter(|l| l.starts_with("G1")).collect();

        assert!(moves[0].ends_with(" F200.0"));
        assert!(!moves[1].contains('F'));
        assert!(moves[2].ends_with(" F1000.0"));
    }

    #[test]
    fn test_layer_and_merge_comments() {
        let program = ToolpathProgram {
            mode: brushpath_config::PressureMode::Position,
            toolpaths: vec![
                toolpath(1, vec![point(0.0, 0.0, -3.0), point(1.0, 0.0, -3.0)]),
                toolpath(1, vec![point(5.0, 0.0, -3.0), point(6.0, 0.0, -3.0)]),
                toolpath(2, vec![point(0.0, 9.0, -3.0), point(1.0, 9.0, -3.0)]),
            ],
            layers: vec![
                LayerSummary {
                    layer_id: 1,
                    input_strokes: 5,
                    merged_strokes: 2,
                    skipped_strokes: 0,
                },
                LayerSummary {
                    layer_id: 2,
                    input_strokes: 1,
                    merged_strokes: 1,
                    skipped_strokes: 0,
                },
            ],
        };
        let gcode = emitter().emit_program(&program);

        assert_eq!(gcode.matches("; Layer 1").count(), 1);
        assert_eq!(gcode.matches("; Layer 2").count(), 1);
        assert_eq!(gcode.matches("; Merged").count(), 1);
        assert!(gcode.contains("; Merged 5 lines into 2 strokes"));
        // Plunge and lift for each of the three toolpaths
        assert_eq!(gcode.matches("G0 Z-3.0000\n").count(), 6);
    }

    #[test]
    fn test_empty_program() {
        let gcode = emitter().emit(&[]);
        assert!(gcode.starts_with("; Generated by brushpath\n"));
        assert!(gcode.ends_with("; End of program\nM2\n"));
        assert!(!gcode.contains("G1"));
    }

    #[test]
    fn test_invalid_feed_rate() {
        assert!(matches!(
            MotionEmitter::new(0.0, OutputUnit::Mm, -3.0),
            Err(ToolpathError::InvalidParameter {
                name: "feed_rate",
                ..
            })
        ));
    }
}
