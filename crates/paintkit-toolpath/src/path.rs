//! Path containers used by the engine.
//!
//! [`ArtPath`] is a piece of source artwork living in a work layer: a
//! lyon path plus its flattened contours and paint metadata.
//! [`PlotPath`] is a finished polyline ready for travel ordering and
//! emission.

use lyon::math::point;
use lyon::path::iterator::*;
use lyon::path::Path;
use paintkit_core::{centroid, polyline_length, signed_area, ColorId, Point, Rect};
use serde::{Deserialize, Serialize};

/// Tolerance used when caching flattened contours of source art.
pub const FLATTEN_TOLERANCE: f64 = 0.1;

/// Points closer than this are considered the same vertex.
const VERTEX_EPSILON: f64 = 1e-6;

/// One simple polyline of a (possibly compound) path.
#[derive(Debug, Clone, PartialEq)]
pub struct Contour {
    /// Vertices; closed contours do not repeat the first point.
    pub points: Vec<Point>,
    pub closed: bool,
}

impl Contour {
    pub fn new(mut points: Vec<Point>, closed: bool) -> Self {
        points.dedup_by(|a, b| a.distance_sq(b) < VERTEX_EPSILON * VERTEX_EPSILON);
        if closed && points.len() > 1 {
            if let (Some(first), Some(last)) = (points.first(), points.last()) {
                if first.distance_to(last) < VERTEX_EPSILON {
                    points.pop();
                }
            }
        }
        Self { points, closed }
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Segments in drawing order, including the closing segment.
    pub fn segments(&self) -> impl Iterator<Item = (Point, Point)> + '_ {
        let n = self.points.len();
        let count = if self.closed && n > 2 {
            n
        } else {
            n.saturating_sub(1)
        };
        (0..count).map(move |i| (self.points[i], self.points[(i + 1) % n]))
    }

    pub fn length(&self) -> f64 {
        self.segments().map(|(a, b)| a.distance_to(&b)).sum()
    }

    /// Point at arc length `distance` from the first vertex.
    ///
    /// Closed contours wrap around, so overshooting the seam keeps
    /// tracing from the start.
    pub fn point_at_length(&self, distance: f64) -> Option<Point> {
        let first = *self.points.first()?;
        let total = self.length();
        if total <= 0.0 || distance <= 0.0 {
            return Some(first);
        }
        let mut remaining = if self.closed && distance > total {
            distance % total
        } else {
            distance.min(total)
        };
        for (a, b) in self.segments() {
            let len = a.distance_to(&b);
            if remaining <= len {
                if len <= 0.0 {
                    return Some(a);
                }
                return Some(a.lerp(&b, remaining / len));
            }
            remaining -= len;
        }
        self.segments().last().map(|(_, b)| b).or(Some(first))
    }

    /// Closed polyline with a repeated first point, for emission.
    pub fn to_polyline(&self) -> Vec<Point> {
        let mut points = self.points.clone();
        if self.closed && points.len() > 2 {
            points.push(points[0]);
        }
        points
    }

    /// Usable as a fill boundary.
    pub fn is_ring(&self) -> bool {
        self.closed && self.points.len() >= 3
    }
}

/// Crossing-number point in polygon test for a single ring.
pub fn ring_contains(ring: &[Point], p: Point) -> bool {
    let n = ring.len();
    if n < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let a = ring[i];
        let b = ring[j];
        if (a.y > p.y) != (b.y > p.y) {
            let x = (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x;
            if p.x < x {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Flattens a lyon path into contours.
pub fn flatten_path(path: &Path, tolerance: f64) -> Vec<Contour> {
    let mut contours = Vec::new();
    let mut current: Vec<Point> = Vec::new();

    for event in path.iter().flattened(tolerance.max(1e-3) as f32) {
        match event {
            lyon::path::Event::Begin { at } => {
                current.clear();
                current.push(Point::new(at.x as f64, at.y as f64));
            }
            lyon::path::Event::Line { to, .. } => {
                current.push(Point::new(to.x as f64, to.y as f64));
            }
            lyon::path::Event::End { close, .. } => {
                let contour = Contour::new(std::mem::take(&mut current), close);
                if !contour.is_empty() {
                    contours.push(contour);
                }
            }
            _ => {}
        }
    }

    contours
}

/// Builds a lyon path from polyline contours.
pub fn build_path(contours: &[Contour]) -> Path {
    let mut builder = Path::builder();
    for contour in contours {
        let mut iter = contour.points.iter();
        let Some(first) = iter.next() else {
            continue;
        };
        builder.begin(point(first.x as f32, first.y as f32));
        for p in iter {
            builder.line_to(point(p.x as f32, p.y as f32));
        }
        builder.end(contour.closed);
    }
    builder.build()
}

/// Source artwork in a work layer.
#[derive(Debug, Clone)]
pub struct ArtPath {
    pub name: String,
    /// Fill paint; [`ColorId::Blank`] when unfilled.
    pub fill: ColorId,
    /// Stroke paint; [`ColorId::Blank`] when unstroked.
    pub stroke: ColorId,
    pub stroke_width: f64,
    path: Path,
    contours: Vec<Contour>,
    bounds: Option<Rect>,
}

fn contour_bounds(contours: &[Contour]) -> Option<Rect> {
    Rect::from_points(contours.iter().flat_map(|c| c.points.iter()))
}

impl ArtPath {
    /// Wraps a lyon path, caching its flattened contours.
    pub fn from_path(name: impl Into<String>, path: Path) -> Self {
        let contours = flatten_path(&path, FLATTEN_TOLERANCE);
        Self {
            name: name.into(),
            fill: ColorId::Blank,
            stroke: ColorId::Blank,
            stroke_width: 1.0,
            path,
            bounds: contour_bounds(&contours),
            contours,
        }
    }

    pub fn from_contours(name: impl Into<String>, contours: Vec<Contour>) -> Self {
        let contours: Vec<Contour> = contours.into_iter().filter(|c| !c.is_empty()).collect();
        Self {
            name: name.into(),
            fill: ColorId::Blank,
            stroke: ColorId::Blank,
            stroke_width: 1.0,
            path: build_path(&contours),
            bounds: contour_bounds(&contours),
            contours,
        }
    }

    /// A closed polygon.
    pub fn polygon(name: impl Into<String>, points: Vec<Point>) -> Self {
        Self::from_contours(name, vec![Contour::new(points, true)])
    }

    /// An open polyline.
    pub fn polyline(name: impl Into<String>, points: Vec<Point>) -> Self {
        Self::from_contours(name, vec![Contour::new(points, false)])
    }

    pub fn with_fill(mut self, color: ColorId) -> Self {
        self.fill = color;
        self
    }

    pub fn with_stroke(mut self, color: ColorId, width: f64) -> Self {
        self.stroke = color;
        self.stroke_width = width;
        self
    }

    /// New geometry carrying this path's name and paint.
    pub fn with_geometry(&self, contours: Vec<Contour>) -> Self {
        let mut out = Self::from_contours(self.name.clone(), contours);
        out.fill = self.fill;
        out.stroke = self.stroke;
        out.stroke_width = self.stroke_width;
        out
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn contours(&self) -> &[Contour] {
        &self.contours
    }

    /// Closed contours with enough points to enclose an area.
    pub fn rings(&self) -> impl Iterator<Item = &Contour> {
        self.contours.iter().filter(|c| c.is_ring())
    }

    pub fn is_empty(&self) -> bool {
        self.contours.iter().all(|c| c.points.len() < 2)
    }

    pub fn is_closed(&self) -> bool {
        !self.contours.is_empty() && self.contours.iter().all(|c| c.closed)
    }

    pub fn has_fill(&self) -> bool {
        !self.fill.is_blank()
    }

    pub fn has_stroke(&self) -> bool {
        !self.stroke.is_blank()
    }

    /// Closes every contour so an outline fully encloses its fill.
    pub fn closed(&self) -> Self {
        let contours = self
            .contours
            .iter()
            .map(|c| Contour::new(c.points.clone(), true))
            .collect();
        self.with_geometry(contours)
    }

    pub fn bounds(&self) -> Option<Rect> {
        self.bounds
    }

    pub fn length(&self) -> f64 {
        self.contours.iter().map(Contour::length).sum()
    }

    /// Even-odd area: rings nested inside an odd number of other rings
    /// are holes.
    pub fn area(&self) -> f64 {
        let rings: Vec<&Contour> = self.rings().collect();
        rings
            .iter()
            .enumerate()
            .map(|(i, ring)| {
                let area = signed_area(&ring.points).abs();
                if nesting_depth(&rings, i) % 2 == 0 {
                    area
                } else {
                    -area
                }
            })
            .sum::<f64>()
            .max(0.0)
    }

    /// Shortest distance from `p` to any edge of this path.
    pub fn distance_to_outline(&self, p: Point) -> f64 {
        self.contours
            .iter()
            .flat_map(|c| c.segments())
            .map(|(a, b)| p.distance_to_segment(&a, &b))
            .fold(f64::INFINITY, f64::min)
    }

    /// Centroid of the largest ring, or the bounds centre for open art.
    pub fn centroid(&self) -> Option<Point> {
        self.rings()
            .max_by(|a, b| {
                signed_area(&a.points)
                    .abs()
                    .total_cmp(&signed_area(&b.points).abs())
            })
            .and_then(|ring| centroid(&ring.points))
            .or_else(|| self.bounds().map(|r| r.center()))
    }
}

/// How many other rings contain ring `index`.
pub(crate) fn nesting_depth(rings: &[&Contour], index: usize) -> usize {
    let Some(probe) = rings[index].points.first().copied() else {
        return 0;
    };
    rings
        .iter()
        .enumerate()
        .filter(|(j, other)| *j != index && ring_contains(&other.points, probe))
        .count()
}

/// What a finished plot path paints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PathRole {
    Stroke,
    Fill,
}

/// A finished polyline ready for travel ordering.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlotPath {
    pub name: String,
    pub role: PathRole,
    pub color: ColorId,
    pub points: Vec<Point>,
}

impl PlotPath {
    pub fn new(
        name: impl Into<String>,
        role: PathRole,
        color: ColorId,
        points: Vec<Point>,
    ) -> Self {
        Self {
            name: name.into(),
            role,
            color,
            points,
        }
    }

    pub fn start(&self) -> Option<Point> {
        self.points.first().copied()
    }

    pub fn end(&self) -> Option<Point> {
        self.points.last().copied()
    }

    pub fn reverse(&mut self) {
        self.points.reverse();
    }

    pub fn length(&self) -> f64 {
        polyline_length(&self.points)
    }

    /// Fewer than two points or no extent at all.
    pub fn is_degenerate(&self) -> bool {
        self.points.len() < 2 || self.length() < VERTEX_EPSILON
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(x: f64, y: f64, size: f64) -> Vec<Point> {
        vec![
            Point::new(x, y),
            Point::new(x + size, y),
            Point::new(x + size, y + size),
            Point::new(x, y + size),
        ]
    }

    #[test]
    fn test_contour_drops_repeated_closing_point() {
        let mut pts = square(0.0, 0.0, 10.0);
        pts.push(Point::new(0.0, 0.0));
        let contour = Contour::new(pts, true);
        assert_eq!(contour.points.len(), 4);
        assert!((contour.length() - 40.0).abs() < 1e-9);
    }

    #[test]
    fn test_point_at_length_wraps_closed() {
        let contour = Contour::new(square(0.0, 0.0, 10.0), true);
        let p = contour.point_at_length(45.0).unwrap();
        assert!((p.x - 5.0).abs() < 1e-9 && p.y.abs() < 1e-9);

        let open = Contour::new(square(0.0, 0.0, 10.0), false);
        let end = open.point_at_length(100.0).unwrap();
        assert_eq!(end, Point::new(0.0, 10.0));
    }

    #[test]
    fn test_area_with_hole() {
        let path = ArtPath::from_contours(
            "donut",
            vec![
                Contour::new(square(0.0, 0.0, 10.0), true),
                Contour::new(square(3.0, 3.0, 4.0), true),
            ],
        );
        assert!((path.area() - 84.0).abs() < 1e-9);
    }

    #[test]
    fn test_flatten_round_trip() {
        let path = ArtPath::polygon("sq", square(0.0, 0.0, 10.0));
        let contours = flatten_path(path.path(), 0.1);
        assert_eq!(contours.len(), 1);
        assert!(contours[0].closed);
        assert_eq!(contours[0].points.len(), 4);
    }

    #[test]
    fn test_ring_contains() {
        let ring = square(0.0, 0.0, 10.0);
        assert!(ring_contains(&ring, Point::new(5.0, 5.0)));
        assert!(!ring_contains(&ring, Point::new(15.0, 5.0)));
    }
}
