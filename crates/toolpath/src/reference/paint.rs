//! SVG paint and color values.

use crate::types::Rgb;

/// A resolved `stroke` or `fill` value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Paint {
    /// Explicitly unpainted
    None,
    Color(Rgb),
    /// Gradients, `currentColor` and anything else we cannot resolve
    Unresolved,
}

impl Paint {
    /// Parse a paint value; `None` means the value is inherited
    pub fn parse(value: &str) -> Option<Self> {
        let paint = match svgtypes::Paint::from_str(value.trim()) {
            Ok(svgtypes::Paint::None) => Paint::None,
            Ok(svgtypes::Paint::Color(color)) => Paint::Color(to_rgb(color)),
            Ok(svgtypes::Paint::Inherit) => return None,
            Ok(_) | Err(_) => Paint::Unresolved,
        };
        Some(paint)
    }
}

fn to_rgb(color: svgtypes::Color) -> Rgb {
    Rgb::new(color.red, color.green, color.blue)
}

/// Parse any CSS color SVG accepts: hex, `rgb()`, `hsl()` or a named color
///
/// Alpha is ignored.
pub fn parse_color(value: &str) -> Option<Rgb> {
    value.trim().parse::<svgtypes::Color>().ok().map(to_rgb)
}
