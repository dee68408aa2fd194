//! Geometry adapter.
//!
//! Every geometric capability the engine needs from a vector scene
//! goes through [`GeometryAdapter`]. [`VectorGeometry`] is the default
//! implementation: lyon for flattening and hit testing, csgrs for
//! boolean operations and cavalier_contours for polygon offsetting.

use crate::layer::{PathId, WorkLayer};
use crate::path::{flatten_path, nesting_depth, ArtPath, Contour};
use cavalier_contours::polyline::{PlineSource, PlineSourceMut, PlineVertex, Polyline};
use csgrs::sketch::Sketch;
use csgrs::traits::CSG;
use lyon::algorithms::hit_test::hit_test_path;
use lyon::math::point;
use lyon::path::{FillRule, Path};
use paintkit_core::{signed_area, Point, Rect, Result};

/// A crossing between two paths.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Intersection {
    pub point: Point,
    /// Arc length along the first path where the crossing happens.
    pub offset: f64,
}

/// What a hit test looks at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitOptions {
    /// Match the interior of filled items.
    pub fill: bool,
    /// Match within half the stroke width of stroked items.
    pub stroke: bool,
    /// Extra slack around strokes and fill edges.
    pub tolerance: f64,
}

impl Default for HitOptions {
    fn default() -> Self {
        Self {
            fill: true,
            stroke: true,
            tolerance: 0.5,
        }
    }
}

/// Vector scene capabilities consumed by the engine.
pub trait GeometryAdapter {
    /// `a` minus `b`, keeping `a`'s name and paint.
    fn boolean_difference(&self, a: &ArtPath, b: &ArtPath) -> Result<ArtPath>;

    /// Polyline approximation with at most `resolution` deviation.
    fn flatten(&self, path: &Path, resolution: f64) -> Vec<Contour>;

    /// Crossings of `a` with `b`, ordered along `a`.
    fn intersections(&self, a: &ArtPath, b: &ArtPath) -> Vec<Intersection>;

    fn point_at_length(&self, path: &ArtPath, distance: f64) -> Option<Point>;

    fn bounding_box(&self, path: &ArtPath) -> Option<Rect>;

    /// Topmost item of `layer` under `point`.
    fn hit_test(&self, layer: &WorkLayer, point: Point, options: &HitOptions) -> Option<PathId>;

    /// Even-odd interior test.
    fn contains_point(&self, path: &ArtPath, point: Point) -> bool;

    /// Offsets a closed ring; positive grows, negative shrinks.
    ///
    /// The result may split into several rings or vanish entirely.
    fn offset_polygon(&self, points: &[Point], distance: f64) -> Vec<Vec<Point>>;
}

/// Crossing of the segment `from`-`to` with `target` nearest to `near`.
///
/// Used to snap traces onto a boundary when they enter or leave it
/// between two samples.
pub fn closest_intersection(
    adapter: &dyn GeometryAdapter,
    from: Point,
    to: Point,
    target: &ArtPath,
    near: Point,
) -> Option<Point> {
    let probe = ArtPath::polyline("probe", vec![from, to]);
    adapter
        .intersections(&probe, target)
        .into_iter()
        .map(|hit| hit.point)
        .min_by(|a, b| a.distance_sq(&near).total_cmp(&b.distance_sq(&near)))
}

/// Default adapter over lyon, csgrs and cavalier_contours.
#[derive(Debug, Clone, Copy, Default)]
pub struct VectorGeometry;

impl VectorGeometry {
    pub fn new() -> Self {
        Self
    }
}

/// Parameter along `p0`-`p1` where it crosses the segment `q0`-`q1`.
///
/// Endpoints lying exactly on the line count as below it, so a
/// straight probe through a closed ring always finds an even number
/// of crossings, even through vertices.
fn segment_crossing(p0: Point, p1: Point, q0: Point, q1: Point) -> Option<f64> {
    let d = p1 - p0;
    let len_sq = d.dot(&d);
    if len_sq < f64::EPSILON {
        return None;
    }
    let s0 = d.cross(&(q0 - p0));
    let s1 = d.cross(&(q1 - p0));
    if (s0 > 0.0) == (s1 > 0.0) {
        return None;
    }
    let u = s0 / (s0 - s1);
    let hit = q0.lerp(&q1, u);
    let t = (hit - p0).dot(&d) / len_sq;
    if (-1e-9..=1.0 + 1e-9).contains(&t) {
        Some(t.clamp(0.0, 1.0))
    } else {
        None
    }
}

fn to_sketch(path: &ArtPath) -> Sketch<()> {
    let rings: Vec<&Contour> = path.rings().collect();
    let mut depths: Vec<(usize, &Contour)> = rings
        .iter()
        .enumerate()
        .map(|(i, ring)| (nesting_depth(&rings, i), *ring))
        .collect();
    depths.sort_by_key(|(depth, _)| *depth);

    // Applying rings outermost first reproduces the even-odd rule.
    let mut sketch = Sketch::new();
    for (depth, ring) in depths {
        let pts: Vec<[f64; 2]> = ring.points.iter().map(|p| [p.x, p.y]).collect();
        let part = Sketch::polygon(&pts, None);
        sketch = if depth % 2 == 0 {
            sketch.union(&part)
        } else {
            sketch.difference(&part)
        };
    }
    sketch
}

fn from_sketch(sketch: &Sketch<()>) -> Vec<Contour> {
    let mut contours = Vec::new();
    let mp = sketch.to_multipolygon();
    for poly in mp.0 {
        let exterior: Vec<Point> = poly
            .exterior()
            .0
            .iter()
            .map(|coord| Point::new(coord.x, coord.y))
            .collect();
        let contour = Contour::new(exterior, true);
        if contour.is_ring() {
            contours.push(contour);
        }
        for interior in poly.interiors() {
            let hole: Vec<Point> = interior
                .0
                .iter()
                .map(|coord| Point::new(coord.x, coord.y))
                .collect();
            let contour = Contour::new(hole, true);
            if contour.is_ring() {
                contours.push(contour);
            }
        }
    }
    contours
}

/// Deduplicates, drops the closing vertex and orients clockwise, the
/// orientation the offset engine expects.
fn prepare_polyline(points: &[Point]) -> Option<Polyline<f64>> {
    let contour = Contour::new(points.to_vec(), true);
    let mut ring = contour.points;
    if ring.len() < 3 {
        return None;
    }
    let area = signed_area(&ring);
    if area.abs() < 1e-9 {
        return None;
    }
    if area > 0.0 {
        ring.reverse();
    }

    let mut polyline = Polyline::new();
    for p in ring {
        polyline.add_vertex(PlineVertex::new(p.x, p.y, 0.0));
    }
    polyline.set_is_closed(true);
    Some(polyline)
}

/// Max angle per segment when flattening offset arcs.
const ARC_STEP: f64 = std::f64::consts::PI / 18.0;

/// Expands bulge arcs into line segments.
fn polyline_points(pline: &Polyline<f64>) -> Vec<Point> {
    let vertices = &pline.vertex_data;
    let n = vertices.len();
    let mut points = Vec::with_capacity(n);
    for i in 0..n {
        let v1 = vertices[i];
        let start = Point::new(v1.x, v1.y);
        points.push(start);

        if v1.bulge.abs() < 1e-9 || (i + 1 == n && !pline.is_closed()) {
            continue;
        }
        let v2 = vertices[(i + 1) % n];
        let end = Point::new(v2.x, v2.y);
        let chord = end - start;
        let chord_len = chord.length();
        if chord_len < 1e-9 {
            continue;
        }

        let abs_bulge = v1.bulge.abs();
        let radius = chord_len * (abs_bulge * abs_bulge + 1.0) / (4.0 * abs_bulge);
        let sagitta = abs_bulge * chord_len / 2.0;
        let m = radius - sagitta;
        let mut offset = Point::new(-m * chord.y / chord_len, m * chord.x / chord_len);
        if v1.bulge < 0.0 {
            offset = offset * -1.0;
        }
        let center = start.midpoint(&end) + offset;

        let sweep = 4.0 * v1.bulge.atan();
        let start_angle = (start.y - center.y).atan2(start.x - center.x);
        let steps = (sweep.abs() / ARC_STEP).ceil().max(1.0) as usize;
        for k in 1..steps {
            let a = start_angle + sweep * (k as f64 / steps as f64);
            points.push(Point::new(
                center.x + radius * a.cos(),
                center.y + radius * a.sin(),
            ));
        }
    }
    points
}

impl GeometryAdapter for VectorGeometry {
    fn boolean_difference(&self, a: &ArtPath, b: &ArtPath) -> Result<ArtPath> {
        let overlaps = match (a.bounds(), b.bounds()) {
            (Some(ra), Some(rb)) => ra.intersects(&rb),
            _ => false,
        };
        if !overlaps || b.rings().next().is_none() {
            return Ok(a.clone());
        }

        let result = to_sketch(a).difference(&to_sketch(b));
        Ok(a.with_geometry(from_sketch(&result)))
    }

    fn flatten(&self, path: &Path, resolution: f64) -> Vec<Contour> {
        flatten_path(path, resolution)
    }

    fn intersections(&self, a: &ArtPath, b: &ArtPath) -> Vec<Intersection> {
        let mut out = Vec::new();
        if let (Some(ra), Some(rb)) = (a.bounds(), b.bounds()) {
            if !ra.intersects(&rb) {
                return out;
            }
        }

        let mut base = 0.0;
        for ca in a.contours() {
            let segments: Vec<(Point, Point)> = ca.segments().collect();
            let last = segments.len().saturating_sub(1);
            for (k, (p0, p1)) in segments.iter().enumerate() {
                let seg_len = p0.distance_to(p1);
                for cb in b.contours() {
                    for (q0, q1) in cb.segments() {
                        let Some(t) = segment_crossing(*p0, *p1, q0, q1) else {
                            continue;
                        };
                        // Shared vertices belong to the following segment.
                        if t < 1.0 || (k == last && !ca.closed) {
                            out.push(Intersection {
                                point: p0.lerp(p1, t),
                                offset: base + t * seg_len,
                            });
                        }
                    }
                }
                base += seg_len;
            }
        }

        out.sort_by(|x, y| x.offset.total_cmp(&y.offset));
        out
    }

    fn point_at_length(&self, path: &ArtPath, distance: f64) -> Option<Point> {
        let contours = path.contours();
        if let [single] = contours {
            return single.point_at_length(distance);
        }
        let mut remaining = distance;
        for contour in contours {
            let len = contour.length();
            if remaining <= len {
                return contour.point_at_length(remaining);
            }
            remaining -= len;
        }
        contours.last().and_then(|c| c.points.last().copied())
    }

    fn bounding_box(&self, path: &ArtPath) -> Option<Rect> {
        if path.is_empty() {
            return None;
        }
        let bb = lyon::algorithms::aabb::bounding_box(path.path().iter());
        Some(Rect {
            min: Point::new(bb.min.x as f64, bb.min.y as f64),
            max: Point::new(bb.max.x as f64, bb.max.y as f64),
        })
    }

    fn hit_test(&self, layer: &WorkLayer, p: Point, options: &HitOptions) -> Option<PathId> {
        for (id, item) in layer.iter_top_down() {
            let reach = options.tolerance + item.stroke_width / 2.0;
            match item.bounds() {
                Some(rect) if rect.inflate(reach).contains(&p) => {}
                _ => continue,
            }

            if options.stroke && item.has_stroke() {
                let on_stroke = item
                    .contours()
                    .iter()
                    .flat_map(|c| c.segments())
                    .any(|(a, b)| p.distance_to_segment(&a, &b) <= reach);
                if on_stroke {
                    return Some(id);
                }
            }

            if options.fill && item.has_fill() && item.rings().next().is_some() {
                let inside = hit_test_path(
                    &point(p.x as f32, p.y as f32),
                    item.path().iter(),
                    FillRule::EvenOdd,
                    options.tolerance.max(0.01) as f32,
                );
                if inside {
                    return Some(id);
                }
            }
        }
        None
    }

    fn contains_point(&self, path: &ArtPath, p: Point) -> bool {
        if path.rings().next().is_none() {
            return false;
        }
        hit_test_path(
            &point(p.x as f32, p.y as f32),
            path.path().iter(),
            FillRule::EvenOdd,
            0.01,
        )
    }

    fn offset_polygon(&self, points: &[Point], distance: f64) -> Vec<Vec<Point>> {
        let Some(polyline) = prepare_polyline(points) else {
            return Vec::new();
        };
        // Clockwise input: negative cavalier offsets move inwards.
        polyline
            .parallel_offset(distance)
            .iter()
            .map(polyline_points)
            .filter(|ring| ring.len() >= 3)
            .collect()
    }
}
