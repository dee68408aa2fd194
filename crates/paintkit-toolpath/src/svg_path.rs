//! SVG path data import.
//!
//! Path data is read with `svgtypes` and replayed onto lyon's SVG path
//! builder, so every command (including elliptical arcs, absolute and
//! relative) ends up as lines and beziers in a plain lyon path.

use lyon::math::{point, vector, Angle};
use lyon::path::builder::SvgPathBuilder;
use lyon::path::{ArcFlags, Path};
use paintkit_core::GeometryError;
use svgtypes::{PathParser, PathSegment};

fn pt(x: f64, y: f64) -> lyon::math::Point {
    point(x as f32, y as f32)
}

fn vec2(x: f64, y: f64) -> lyon::math::Vector {
    vector(x as f32, y as f32)
}

fn replay(builder: &mut impl SvgPathBuilder, segment: PathSegment) {
    match segment {
        PathSegment::MoveTo { abs: true, x, y } => {
            builder.move_to(pt(x, y));
        }
        PathSegment::MoveTo { abs: false, x, y } => {
            builder.relative_move_to(vec2(x, y));
        }
        PathSegment::LineTo { abs: true, x, y } => {
            builder.line_to(pt(x, y));
        }
        PathSegment::LineTo { abs: false, x, y } => {
            builder.relative_line_to(vec2(x, y));
        }
        PathSegment::HorizontalLineTo { abs: true, x } => {
            builder.horizontal_line_to(x as f32);
        }
        PathSegment::HorizontalLineTo { abs: false, x } => {
            builder.relative_horizontal_line_to(x as f32);
        }
        PathSegment::VerticalLineTo { abs: true, y } => {
            builder.vertical_line_to(y as f32);
        }
        PathSegment::VerticalLineTo { abs: false, y } => {
            builder.relative_vertical_line_to(y as f32);
        }
        PathSegment::CurveTo {
            abs,
            x1,
            y1,
            x2,
            y2,
            x,
            y,
        } => {
            if abs {
                builder.cubic_bezier_to(pt(x1, y1), pt(x2, y2), pt(x, y));
            } else {
                builder.relative_cubic_bezier_to(vec2(x1, y1), vec2(x2, y2), vec2(x, y));
            }
        }
        PathSegment::SmoothCurveTo { abs, x2, y2, x, y } => {
            if abs {
                builder.smooth_cubic_bezier_to(pt(x2, y2), pt(x, y));
            } else {
                builder.smooth_relative_cubic_bezier_to(vec2(x2, y2), vec2(x, y));
            }
        }
        PathSegment::Quadratic { abs, x1, y1, x, y } => {
            if abs {
                builder.quadratic_bezier_to(pt(x1, y1), pt(x, y));
            } else {
                builder.relative_quadratic_bezier_to(vec2(x1, y1), vec2(x, y));
            }
        }
        PathSegment::SmoothQuadratic { abs, x, y } => {
            if abs {
                builder.smooth_quadratic_bezier_to(pt(x, y));
            } else {
                builder.smooth_relative_quadratic_bezier_to(vec2(x, y));
            }
        }
        PathSegment::EllipticalArc {
            abs,
            rx,
            ry,
            x_axis_rotation,
            large_arc,
            sweep,
            x,
            y,
        } => {
            let radii = vec2(rx, ry);
            let rotation = Angle::degrees(x_axis_rotation as f32);
            let flags = ArcFlags { large_arc, sweep };
            if abs {
                builder.arc_to(radii, rotation, flags, pt(x, y));
            } else {
                builder.relative_arc_to(radii, rotation, flags, vec2(x, y));
            }
        }
        PathSegment::ClosePath { .. } => {
            builder.close();
        }
    }
}

/// Parses SVG path data into a lyon path.
pub fn parse_path_data(data: &str) -> Result<Path, GeometryError> {
    let mut builder = Path::svg_builder();
    let mut segments = 0;
    for (position, segment) in PathParser::from(data).enumerate() {
        let segment = segment.map_err(|e| GeometryError::PathData {
            position,
            reason: e.to_string(),
        })?;
        replay(&mut builder, segment);
        segments += 1;
    }
    if segments == 0 {
        return Err(GeometryError::Degenerate {
            reason: "empty path data".to_string(),
        });
    }
    Ok(builder.build())
}
