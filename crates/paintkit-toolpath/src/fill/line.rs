//! Parallel line fill.
//!
//! Runs in two phases per pass. Casting sweeps probe lines across an
//! ellipse circumscribing the path's bounds, one probe per step, and
//! buckets the resulting inside spans into groups of neighbouring
//! segments. Joining then walks the groups, one per step, chaining
//! each group's segments into polylines.
//!
//! `hatch` adds a second pass at 90 degrees to the first.

use super::FillJobContext;
use crate::adapter::GeometryAdapter;
use crate::layer::PathId;
use crate::path::{ArtPath, PathRole, PlotPath};
use crate::scheduler::StepResult;
use crate::simplify::{chaikin, douglas_peucker};
use paintkit_core::{Point, Rect, Result};
use paintkit_settings::FillType;
use rand::Rng;

/// Spans shorter than this are dropped.
const MIN_SEGMENT_LENGTH: f64 = 1e-3;

/// Allowed boundary crossings on a connector between two spans.
const MAX_CONNECTOR_CROSSINGS: usize = 2;

const SMOOTH_ITERATIONS: usize = 2;
const SMOOTH_TOLERANCE: f64 = 0.25;

/// How spans are connected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineStyle {
    /// Every span is drawn on its own.
    Straight,
    /// Spans in a group are joined end to end.
    Zigzag,
    /// Joined, then corner-cut and simplified.
    Smooth,
}

impl LineStyle {
    pub fn fill_type(&self) -> FillType {
        match self {
            LineStyle::Straight => FillType::LineStraight,
            LineStyle::Zigzag => FillType::LineZigzag,
            LineStyle::Smooth => FillType::LineSmooth,
        }
    }
}

/// Probe lines covering `bounds` at `angle` degrees, `spacing` apart.
///
/// The probes sweep the ellipse through the corners of `bounds`, so
/// every point of the rectangle is covered. The spacing is adjusted to
/// divide the sweep evenly, and each probe overhangs the ellipse by one
/// spacing on both ends.
pub fn scan_lines(bounds: &Rect, angle: f64, spacing: f64) -> Vec<(Point, Point)> {
    if spacing <= 0.0 || !spacing.is_finite() {
        return Vec::new();
    }
    let center = bounds.center();
    let a = bounds.width() / std::f64::consts::SQRT_2;
    let b = bounds.height() / std::f64::consts::SQRT_2;
    let dir = Point::from_angle(angle);
    let normal = Point::from_angle(angle + 90.0);

    let reach = (a * a * normal.x * normal.x + b * b * normal.y * normal.y).sqrt();
    let half_len = (a * a * dir.x * dir.x + b * b * dir.y * dir.y).sqrt() + spacing;
    let count = ((2.0 * reach) / spacing).ceil().max(1.0) as usize;
    let step = 2.0 * reach / count as f64;

    (0..count)
        .map(|i| {
            let offset = -reach + (i as f64 + 0.5) * step;
            let mid = center + normal * offset;
            (mid - dir * half_len, mid + dir * half_len)
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Span {
    a: Point,
    b: Point,
    /// Probe index within the pass.
    line: usize,
}

impl Span {
    fn gap_to(&self, other: &Span) -> f64 {
        [
            self.a.distance_to(&other.a),
            self.a.distance_to(&other.b),
            self.b.distance_to(&other.a),
            self.b.distance_to(&other.b),
        ]
        .into_iter()
        .fold(f64::INFINITY, f64::min)
    }

    /// Endpoints ordered so the one nearer `from` comes first.
    fn oriented_from(&self, from: Point) -> (Point, Point) {
        if self.b.distance_sq(&from) < self.a.distance_sq(&from) {
            (self.b, self.a)
        } else {
            (self.a, self.b)
        }
    }
}

#[derive(Debug, Clone)]
enum Phase {
    Cast { next: usize },
    Join { next: usize },
}

#[derive(Debug, Clone)]
struct PathJob {
    id: PathId,
    /// Snapshot of the layer item taken when the fill began.
    target: ArtPath,
    base_angle: f64,
    pass: usize,
    probes: Vec<(Point, Point)>,
    groups: Vec<Vec<Span>>,
    phase: Phase,
}

/// Parallel line fill state.
#[derive(Debug, Clone)]
pub struct LineFill {
    style: LineStyle,
    job: Option<PathJob>,
}

impl LineFill {
    pub fn new(style: LineStyle) -> Self {
        Self { style, job: None }
    }

    pub fn style(&self) -> LineStyle {
        self.style
    }

    pub fn reset(&mut self) {
        self.job = None;
    }

    pub fn step(&mut self, ctx: &mut FillJobContext, id: PathId) -> Result<StepResult> {
        if self.job.as_ref().map(|job| job.id) != Some(id) {
            let Some(job) = Self::begin(ctx, id) else {
                return Ok(StepResult::Done);
            };
            self.job = Some(job);
        }
        if !ctx.layer.contains(id) {
            self.job = None;
            return Ok(StepResult::Done);
        }
        let adapter = ctx.adapter();
        let passes = if ctx.settings.hatch { 2 } else { 1 };
        let style = self.style;
        let Some(job) = self.job.as_mut() else {
            return Ok(StepResult::Done);
        };
        let target = &job.target;

        match job.phase {
            Phase::Cast { next } => {
                if let Some(&(from, to)) = job.probes.get(next) {
                    let threshold = ctx.settings.effective_grouping_threshold();
                    for span in cast_probe(adapter.as_ref(), target, ctx.canvas, from, to, next) {
                        group_span(&mut job.groups, span, threshold);
                    }
                    job.phase = Phase::Cast { next: next + 1 };
                } else {
                    tracing::trace!(
                        "'{}' pass {}: {} probes, {} groups",
                        target.name,
                        job.pass,
                        job.probes.len(),
                        job.groups.len()
                    );
                    job.phase = Phase::Join { next: 0 };
                }
                Ok(StepResult::Continue)
            }
            Phase::Join { next } => {
                if let Some(group) = job.groups.get(next) {
                    let line_width = ctx.settings.line_width;
                    for points in join_group(adapter.as_ref(), target, group, style, line_width) {
                        ctx.emit(PlotPath::new(
                            target.name.clone(),
                            PathRole::Fill,
                            target.fill,
                            points,
                        ));
                    }
                    job.phase = Phase::Join { next: next + 1 };
                    return Ok(StepResult::Continue);
                }

                if job.pass + 1 < passes {
                    job.pass += 1;
                    let angle = job.base_angle + 90.0 * job.pass as f64;
                    job.probes = probes_for(&job.target, angle, ctx.settings.fill_spacing);
                    job.groups.clear();
                    job.phase = Phase::Cast { next: 0 };
                    return Ok(StepResult::Continue);
                }

                tracing::debug!("Line fill of '{}' complete", job.target.name);
                self.job = None;
                Ok(StepResult::Done)
            }
        }
    }

    fn begin(ctx: &mut FillJobContext, id: PathId) -> Option<PathJob> {
        let target = ctx.layer.get(id)?.clone();
        if target.rings().next().is_none() || target.area() <= f64::EPSILON {
            tracing::trace!("'{}' has no area to fill", target.name);
            return None;
        }
        let base_angle = if ctx.settings.randomize_angle {
            ctx.rng().gen_range(0.0..180.0)
        } else {
            ctx.settings.fill_angle
        };
        let probes = probes_for(&target, base_angle, ctx.settings.fill_spacing);
        if probes.is_empty() {
            return None;
        }
        Some(PathJob {
            id,
            target,
            base_angle,
            pass: 0,
            probes,
            groups: Vec::new(),
            phase: Phase::Cast { next: 0 },
        })
    }
}

fn probes_for(target: &ArtPath, angle: f64, spacing: f64) -> Vec<(Point, Point)> {
    match target.bounds() {
        Some(bounds) => scan_lines(&bounds, angle, spacing),
        None => Vec::new(),
    }
}

/// Inside spans of one probe, clipped to the canvas.
fn cast_probe(
    adapter: &dyn GeometryAdapter,
    target: &ArtPath,
    canvas: Rect,
    from: Point,
    to: Point,
    line: usize,
) -> Vec<Span> {
    let probe = ArtPath::polyline("probe", vec![from, to]);
    let hits = adapter.intersections(&probe, target);
    if hits.len() % 2 != 0 {
        tracing::trace!("Probe {} of '{}' has unpaired crossings, skipping", line, target.name);
        return Vec::new();
    }
    hits.chunks_exact(2)
        .filter_map(|pair| canvas.clip_segment(pair[0].point, pair[1].point))
        .filter(|(a, b)| a.distance_to(b) > MIN_SEGMENT_LENGTH)
        .map(|(a, b)| Span { a, b, line })
        .collect()
}

/// Appends `span` to the nearest group whose last span sits on the
/// previous probe, or starts a new group.
fn group_span(groups: &mut Vec<Vec<Span>>, span: Span, threshold: f64) {
    let best = groups
        .iter()
        .enumerate()
        .filter_map(|(i, group)| {
            let last = group.last()?;
            (last.line + 1 == span.line).then(|| (i, last.gap_to(&span)))
        })
        .filter(|(_, gap)| *gap <= threshold)
        .min_by(|a, b| a.1.total_cmp(&b.1));

    match best {
        Some((i, _)) => groups[i].push(span),
        None => groups.push(vec![span]),
    }
}

/// Whether the pen may stay down between two spans.
fn can_connect(
    adapter: &dyn GeometryAdapter,
    target: &ArtPath,
    from: Point,
    to: Point,
    line_width: f64,
) -> bool {
    let mid = from.midpoint(&to);
    let slack = (line_width / 2.0).max(0.5);
    let mid_ok = adapter.contains_point(target, mid) || target.distance_to_outline(mid) <= slack;
    if !mid_ok {
        return false;
    }
    let connector = ArtPath::polyline("connector", vec![from, to]);
    adapter.intersections(&connector, target).len() <= MAX_CONNECTOR_CROSSINGS
}

fn join_group(
    adapter: &dyn GeometryAdapter,
    target: &ArtPath,
    group: &[Span],
    style: LineStyle,
    line_width: f64,
) -> Vec<Vec<Point>> {
    let mut lines: Vec<Vec<Point>> = Vec::new();
    let mut current: Vec<Point> = Vec::new();

    for span in group {
        let (start, end) = match current.last() {
            Some(&tail) => span.oriented_from(tail),
            None => (span.a, span.b),
        };
        let joined = match (style, current.last()) {
            (LineStyle::Straight, _) | (_, None) => false,
            (_, Some(&tail)) => can_connect(adapter, target, tail, start, line_width),
        };
        if !joined && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        current.push(start);
        current.push(end);
    }
    if !current.is_empty() {
        lines.push(current);
    }

    if style == LineStyle::Smooth {
        lines = lines
            .into_iter()
            .map(|line| douglas_peucker(&chaikin(&line, SMOOTH_ITERATIONS), SMOOTH_TOLERANCE))
            .collect();
    }
    lines
}
