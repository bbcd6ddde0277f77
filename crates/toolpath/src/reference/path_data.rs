//! SVG path data (`d` attribute) flattening.
//!
//! Path data is parsed into absolute segments, built into a lyon path and
//! flattened within [`FLATTEN_TOLERANCE`]. Elliptical arcs arrive as cubic
//! curves and flatten like any other curve.

use glam::DVec2;
use lyon::math::{point, Point};
use lyon::path::iterator::PathIterator;
use lyon::path::{Event, Path};
use svgtypes::{SimplePathSegment, SimplifyingPathParser};
use tracing::debug;

use crate::constants::FLATTEN_TOLERANCE;

fn to_point(x: f64, y: f64) -> Point {
    point(x as f32, y as f32)
}

fn to_dvec(p: Point) -> DVec2 {
    DVec2::new(p.x as f64, p.y as f64)
}

/// Build a lyon path from path data, stopping at the first error
fn build_path(data: &str) -> Path {
    let mut builder = Path::builder();
    let mut open = false;
    let mut position = Point::zero();
    let mut start = Point::zero();

    for segment in SimplifyingPathParser::from(data) {
        let segment = match segment {
            Ok(segment) => segment,
            Err(err) => {
                // Rendering stops at the first error in path data
                debug!("Path data error, keeping what came before: {}", err);
                break;
            }
        };

        if let SimplePathSegment::MoveTo { x, y } = segment {
            if open {
                builder.end(false);
            }
            position = to_point(x, y);
            start = position;
            builder.begin(position);
            open = true;
            continue;
        }
        if let SimplePathSegment::ClosePath = segment {
            if open {
                builder.end(true);
                open = false;
            }
            position = start;
            continue;
        }

        if !open {
            builder.begin(position);
            start = position;
            open = true;
        }
        position = match segment {
            SimplePathSegment::LineTo { x, y } => {
                let to = to_point(x, y);
                builder.line_to(to);
                to
            }
            SimplePathSegment::Quadratic { x1, y1, x, y } => {
                let to = to_point(x, y);
                builder.quadratic_bezier_to(to_point(x1, y1), to);
                to
            }
            SimplePathSegment::CurveTo {
                x1,
                y1,
                x2,
                y2,
                x,
                y,
            } => {
                let to = to_point(x, y);
                builder.cubic_bezier_to(to_point(x1, y1), to_point(x2, y2), to);
                to
            }
            SimplePathSegment::MoveTo { .. } | SimplePathSegment::ClosePath => position,
        };
    }

    if open {
        builder.end(false);
    }
    builder.build()
}

/// Flatten path data into polylines, one per subpath, in user units
///
/// Parsing stops at the first malformed segment; everything before it is
/// kept. Subpaths with fewer than two points are discarded.
pub fn parse_path_data(data: &str) -> Vec<Vec<DVec2>> {
    let path = build_path(data);
    let mut polylines = Vec::new();
    let mut current: Vec<DVec2> = Vec::new();

    for event in path.iter().flattened(FLATTEN_TOLERANCE) {
        match event {
            Event::Begin { at } => {
                if !current.is_empty() {
                    polylines.push(std::mem::take(&mut current));
                }
                current.push(to_dvec(at));
            }
            Event::Line { to, .. } => current.push(to_dvec(to)),
            Event::End { first, close, .. } => {
                let first = to_dvec(first);
                if close && current.last() != Some(&first) {
                    current.push(first);
                }
                polylines.push(std::mem::take(&mut current));
            }
            _ => {}
        }
    }
    if !current.is_empty() {
        polylines.push(current);
    }

    polylines.retain(|polyline| polyline.len() >= 2);
    polylines
}
