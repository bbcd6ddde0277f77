//! Reads colored geometry out of an SVG document.

use glam::DVec2;
use roxmltree::{Node, ParsingOptions};
use svgtypes::{Length, LengthUnit, PointsParser, ViewBox};
use tracing::{debug, info, trace};

use crate::constants::MM_PER_PX;
use crate::types::Rgb;

use super::path_data::parse_path_data;
use super::{Paint, ReferenceDocument, ReferenceError};

/// Elements whose children are never rendered directly
const NON_RENDERED: &[&str] = &["defs", "clipPath", "mask", "symbol", "marker", "pattern"];

/// Maps SVG user units to millimeters
#[derive(Debug, Clone, Copy, PartialEq)]
struct Viewport {
    origin: DVec2,
    scale: DVec2,
}

impl Viewport {
    fn from_root(root: Node<'_, '_>) -> Self {
        let width = root.attribute("width").and_then(length_mm);
        let height = root.attribute("height").and_then(length_mm);

        let Some(view_box) = root
            .attribute("viewBox")
            .and_then(|value| value.parse::<ViewBox>().ok())
        else {
            // Without a viewBox user units are CSS pixels
            return Self {
                origin: DVec2::ZERO,
                scale: DVec2::splat(MM_PER_PX),
            };
        };

        let axis = |physical: Option<f64>, user: f64| match physical {
            Some(mm) if user > 0.0 => mm / user,
            _ => MM_PER_PX,
        };
        Self {
            origin: DVec2::new(view_box.x, view_box.y),
            scale: DVec2::new(axis(width, view_box.w), axis(height, view_box.h)),
        }
    }

    fn to_mm(&self, point: DVec2) -> DVec2 {
        (point - self.origin) * self.scale
    }
}

/// Length attribute in millimeters; `None` for relative units
fn length_mm(value: &str) -> Option<f64> {
    let length: Length = value.trim().parse().ok()?;
    let mm_per_unit = match length.unit {
        LengthUnit::None | LengthUnit::Px => MM_PER_PX,
        LengthUnit::Mm => 1.0,
        LengthUnit::Cm => 10.0,
        LengthUnit::In => 25.4,
        LengthUnit::Pt => 25.4 / 72.0,
        LengthUnit::Pc => 25.4 / 6.0,
        _ => return None,
    };
    Some(length.number * mm_per_unit)
}

/// Paint inherited down the element tree
#[derive(Debug, Clone, Copy, Default)]
struct InheritedPaint {
    stroke: Option<Paint>,
    fill: Option<Paint>,
}

impl InheritedPaint {
    fn descend(self, node: Node<'_, '_>) -> Self {
        Self {
            stroke: property(node, "stroke").and_then(Paint::parse).or(self.stroke),
            fill: property(node, "fill").and_then(Paint::parse).or(self.fill),
        }
    }

    /// The paint that colors this element's geometry
    ///
    /// A visible stroke wins; otherwise the fill, which defaults to black.
    fn effective(self) -> Paint {
        match (self.stroke, self.fill) {
            (Some(stroke @ (Paint::Color(_) | Paint::Unresolved)), _) => stroke,
            (_, Some(fill)) => fill,
            (_, None) => Paint::Color(Rgb::BLACK),
        }
    }
}

/// Presentation attribute, falling back to the inline style declaration
fn property<'a>(node: Node<'a, '_>, name: &str) -> Option<&'a str> {
    node.attribute(name).or_else(|| {
        node.attribute("style")?
            .split(';')
            .filter_map(|declaration| declaration.split_once(':'))
            .find(|(key, _)| key.trim() == name)
            .map(|(_, value)| value.trim())
    })
}

/// Coordinate attribute in user units; missing or relative values read as 0
fn coordinate(node: Node<'_, '_>, name: &str) -> f64 {
    node.attribute(name)
        .and_then(|value| value.trim().parse::<Length>().ok())
        .filter(|length| matches!(length.unit, LengthUnit::None | LengthUnit::Px))
        .map_or(0.0, |length| length.number)
}

/// Polylines drawn by one element, in user units
fn element_geometry(node: Node<'_, '_>) -> Vec<Vec<DVec2>> {
    match node.tag_name().name() {
        "path" => node.attribute("d").map(parse_path_data).unwrap_or_default(),
        "line" => vec![vec![
            DVec2::new(coordinate(node, "x1"), coordinate(node, "y1")),
            DVec2::new(coordinate(node, "x2"), coordinate(node, "y2")),
        ]],
        tag @ ("polyline" | "polygon") => {
            let mut points: Vec<DVec2> = node
                .attribute("points")
                .map(|value| {
                    PointsParser::from(value)
                        .map(|(x, y)| DVec2::new(x, y))
                        .collect()
                })
                .unwrap_or_default();
            if points.len() < 2 {
                return Vec::new();
            }
            if tag == "polygon" && points.first() != points.last() {
                points.push(points[0]);
            }
            vec![points]
        }
        _ => Vec::new(),
    }
}

fn collect(
    node: Node<'_, '_>,
    inherited: InheritedPaint,
    viewport: &Viewport,
    document: &mut ReferenceDocument,
) {
    let tag = node.tag_name().name();
    if NON_RENDERED.contains(&tag) {
        return;
    }
    let paint = inherited.descend(node);

    let geometry = element_geometry(node);
    if !geometry.is_empty() {
        let color = match paint.effective() {
            Paint::None => {
                trace!("Skipping unpainted <{}>", tag);
                None
            }
            Paint::Color(color) => Some(Some(color)),
            Paint::Unresolved => {
                debug!("Unresolved paint on <{}>, sampling as mid pressure", tag);
                Some(None)
            }
        };
        if let Some(color) = color {
            for polyline in geometry {
                let points = polyline.into_iter().map(|p| viewport.to_mm(p)).collect();
                document.push(points, color);
            }
        }
    }

    for child in node.children().filter(Node::is_element) {
        collect(child, paint, viewport, document);
    }
}

/// Parse SVG text into colored polylines in millimeters
///
/// Fails if the XML is malformed or nothing visible with geometry is found.
/// Transforms are not applied.
pub fn parse_svg(text: &str) -> Result<ReferenceDocument, ReferenceError> {
    let options = ParsingOptions {
        allow_dtd: true,
        ..ParsingOptions::default()
    };
    let xml = roxmltree::Document::parse_with_options(text, options)?;
    let root = xml.root_element();
    let viewport = Viewport::from_root(root);
    debug!(
        "Reference viewport origin ({:.3}, {:.3}), scale ({:.5}, {:.5}) mm/unit",
        viewport.origin.x, viewport.origin.y, viewport.scale.x, viewport.scale.y
    );

    let mut document = ReferenceDocument::new();
    collect(root, InheritedPaint::default(), &viewport, &mut document);

    if document.is_empty() {
        return Err(ReferenceError::NoColoredGeometry);
    }
    info!("Loaded {} reference paths", document.paths.len());
    Ok(document)
}
