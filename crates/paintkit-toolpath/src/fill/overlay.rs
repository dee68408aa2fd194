//! Overlay fill.
//!
//! One traversal curve (an outward Archimedean spiral, or a custom
//! pattern) is laid over each target and walked one sample at a time.
//! Samples that hit the target in the live fill layer are collected into
//! traces; a trace ends when the curve leaves the target or passes under
//! another shape. Traces are snapped to the target's boundary wherever
//! the curve crosses it.

use super::FillJobContext;
use crate::adapter::{GeometryAdapter, HitOptions};
use crate::layer::PathId;
use crate::path::{ArtPath, PathRole, PlotPath};
use crate::scheduler::StepResult;
use paintkit_core::{Point, Rect, Result};
use paintkit_settings::{FillSettings, FillType, OverlayAlign};
use std::f64::consts::TAU;
use std::rc::Rc;

/// Points of an Archimedean spiral around the origin.
///
/// Consecutive turns are `spacing` apart and consecutive points `step`
/// apart along the curve; the spiral stops once its radius exceeds
/// `radius`.
pub fn spiral_curve(spacing: f64, step: f64, radius: f64) -> Vec<Point> {
    if spacing <= 0.0 || step <= 0.0 || radius <= 0.0 {
        return Vec::new();
    }
    let k = spacing / TAU;
    let mut points = vec![Point::new(0.0, 0.0)];
    let mut theta = 0.0f64;
    loop {
        let r = k * theta;
        theta += step / (r * r + k * k).sqrt();
        let r = k * theta;
        points.push(Point::new(r * theta.cos(), r * theta.sin()));
        if r > radius {
            break;
        }
    }
    points
}

/// Where the curve crosses the target's outline.
#[derive(Debug, Clone, Copy, PartialEq)]
struct CurveHit {
    /// Curve segment `segment` to `segment + 1`.
    segment: usize,
    point: Point,
}

#[derive(Debug, Clone)]
struct PathJob {
    id: PathId,
    offset: Point,
    /// Bounding circle around the alignment centre, for path-aligned curves.
    reach: Option<f64>,
    bounds: Rect,
    cursor: usize,
    hits: Vec<CurveHit>,
    next_hit: usize,
    trace: Vec<Point>,
    inside: bool,
}

impl PathJob {
    fn hits_on(&self, segment: usize) -> impl Iterator<Item = &CurveHit> + '_ {
        self.hits.iter().filter(move |hit| hit.segment == segment)
    }

    fn hits_remain_after(&self, segment: usize) -> bool {
        self.hits[self.next_hit..].iter().any(|hit| hit.segment >= segment)
    }
}

/// Overlay fill state. The curve is shared by every path in the job.
#[derive(Debug, Clone)]
pub struct OverlayFill {
    fill_type: FillType,
    curve: Rc<Vec<Point>>,
    align: OverlayAlign,
    job: Option<PathJob>,
}

impl OverlayFill {
    /// Builds the traversal curve for the job.
    ///
    /// `overlay` uses the custom pattern when one is configured and falls
    /// back to the spiral otherwise.
    pub fn new(fill_type: FillType, settings: &FillSettings, canvas: Rect) -> Self {
        let custom = match (fill_type, &settings.overlay_pattern) {
            (FillType::Overlay, Some(pattern)) if pattern.len() >= 2 => Some(pattern.clone()),
            (FillType::Overlay, _) => {
                tracing::debug!("No overlay pattern configured, using a spiral");
                None
            }
            _ => None,
        };
        let curve = custom.unwrap_or_else(|| {
            spiral_curve(
                settings.fill_spacing,
                settings.fill_precision,
                canvas.diagonal(),
            )
        });
        Self {
            fill_type,
            curve: Rc::new(curve),
            align: settings.overlay_align,
            job: None,
        }
    }

    pub fn fill_type(&self) -> FillType {
        self.fill_type
    }

    pub fn curve(&self) -> &[Point] {
        &self.curve
    }

    pub fn reset(&mut self) {
        self.job = None;
    }

    pub fn step(&mut self, ctx: &mut FillJobContext, id: PathId) -> Result<StepResult> {
        if self.job.as_ref().map(|job| job.id) != Some(id) {
            let Some(job) = self.begin(ctx, id) else {
                return Ok(StepResult::Done);
            };
            self.job = Some(job);
        }
        let Some(target) = ctx.layer.get(id).cloned() else {
            self.job = None;
            return Ok(StepResult::Done);
        };
        let adapter = ctx.adapter();
        let curve = Rc::clone(&self.curve);
        let Some(job) = self.job.as_mut() else {
            return Ok(StepResult::Done);
        };
        let options = HitOptions {
            fill: true,
            stroke: false,
            tolerance: 0.0,
        };

        loop {
            let k = job.cursor;
            let Some(&local) = curve.get(k) else {
                flush(ctx, job, &target);
                return Ok(self.finish(&target));
            };
            let p = local + job.offset;
            if let Some(reach) = job.reach {
                if local.length() > reach {
                    flush(ctx, job, &target);
                    return Ok(self.finish(&target));
                }
            }
            job.cursor += 1;

            // Skip quickly over samples that cannot touch the target.
            if !job.bounds.contains(&p) {
                if job.inside {
                    exit(ctx, job, &target, k);
                }
                advance_hits(job, k);
                if !job.hits_remain_after(k) {
                    return Ok(self.finish(&target));
                }
                continue;
            }

            let inside = adapter.hit_test(&ctx.layer, p, &options) == Some(id);
            match (job.inside, inside) {
                (false, true) => {
                    let snap = k
                        .checked_sub(1)
                        .and_then(|prev| job.hits_on(prev).last().map(|hit| hit.point));
                    job.trace.extend(snap);
                    job.trace.push(p);
                }
                (true, true) => job.trace.push(p),
                (true, false) => exit(ctx, job, &target, k),
                (false, false) => {}
            }
            job.inside = inside;
            advance_hits(job, k);

            if !inside && !job.hits_remain_after(k) && !adapter.contains_point(&target, p) {
                return Ok(self.finish(&target));
            }
            return Ok(StepResult::Continue);
        }
    }

    fn finish(&mut self, target: &ArtPath) -> StepResult {
        tracing::debug!("Overlay fill of '{}' complete", target.name);
        self.job = None;
        StepResult::Done
    }

    fn begin(&self, ctx: &FillJobContext, id: PathId) -> Option<PathJob> {
        let target = ctx.layer.get(id)?;
        if target.rings().next().is_none() || self.curve.len() < 2 {
            return None;
        }
        let bounds = target.bounds()?;
        let center = match self.align {
            OverlayAlign::Path => target.centroid()?,
            OverlayAlign::View => ctx.canvas.center(),
        };
        let reach = match self.align {
            OverlayAlign::Path => Some(
                [
                    bounds.min,
                    bounds.max,
                    Point::new(bounds.min.x, bounds.max.y),
                    Point::new(bounds.max.x, bounds.min.y),
                ]
                .iter()
                .map(|corner| corner.distance_to(&center))
                .fold(0.0, f64::max),
            ),
            OverlayAlign::View => None,
        };

        let adapter = ctx.adapter();
        let hits = curve_hits(adapter.as_ref(), &self.curve, center, target, &bounds, reach);
        if hits.is_empty() && !adapter.contains_point(target, self.curve[0] + center) {
            tracing::trace!("Overlay curve never reaches '{}'", target.name);
            return None;
        }

        Some(PathJob {
            id,
            offset: center,
            reach,
            bounds,
            cursor: 0,
            hits,
            next_hit: 0,
            trace: Vec::new(),
            inside: false,
        })
    }
}

/// Every crossing of the curve with the target's outline, in curve order.
fn curve_hits(
    adapter: &dyn GeometryAdapter,
    curve: &[Point],
    offset: Point,
    target: &ArtPath,
    bounds: &Rect,
    reach: Option<f64>,
) -> Vec<CurveHit> {
    let mut hits = Vec::new();
    for (segment, w) in curve.windows(2).enumerate() {
        if reach.is_some_and(|r| w[0].length() > r) {
            break;
        }
        let (a, b) = (w[0] + offset, w[1] + offset);
        let seg_bounds = Rect::from_points([&a, &b]);
        if !seg_bounds.is_some_and(|r| r.intersects(bounds)) {
            continue;
        }
        let probe = ArtPath::polyline("curve", vec![a, b]);
        hits.extend(
            adapter
                .intersections(&probe, target)
                .into_iter()
                .map(|hit| CurveHit {
                    segment,
                    point: hit.point,
                }),
        );
    }
    hits
}

fn advance_hits(job: &mut PathJob, sample: usize) {
    while job
        .hits
        .get(job.next_hit)
        .is_some_and(|hit| hit.segment < sample)
    {
        job.next_hit += 1;
    }
}

/// Ends the trace when sample `k` is no longer inside.
fn exit(ctx: &mut FillJobContext, job: &mut PathJob, target: &ArtPath, k: usize) {
    let snap = k
        .checked_sub(1)
        .and_then(|prev| job.hits_on(prev).next().map(|hit| hit.point));
    job.trace.extend(snap);
    job.inside = false;
    flush(ctx, job, target);
}

fn flush(ctx: &mut FillJobContext, job: &mut PathJob, target: &ArtPath) {
    let points = std::mem::take(&mut job.trace);
    if points.len() >= 2 {
        ctx.emit(PlotPath::new(
            target.name.clone(),
            PathRole::Fill,
            target.fill,
            points,
        ));
    }
}
