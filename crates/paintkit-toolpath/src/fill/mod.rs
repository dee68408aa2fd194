//! Fill algorithms.
//!
//! Every algorithm turns the interior of one closed path into plottable
//! polylines, one bounded quantum of work per [`FillAlgorithm::step`].
//! The caller keeps calling `step` with the same [`PathId`] until it
//! returns [`StepResult::Done`], then moves on to the next path.
//!
//! Shared job state (settings, the scratch layer, the geometry adapter
//! and the accumulated output) lives in [`FillJobContext`], owned by the
//! job runner and passed into every call.

pub mod line;
pub mod overlay;
pub mod pocket;

pub use line::{scan_lines, LineFill, LineStyle};
pub use overlay::{spiral_curve, OverlayFill};
pub use pocket::PocketFill;

use crate::adapter::{self, GeometryAdapter};
use crate::layer::{PathId, WorkLayer};
use crate::path::{nesting_depth, ring_contains, ArtPath, Contour, PlotPath};
use crate::scheduler::StepResult;
use paintkit_core::{ConfigError, GeometryError, Point, Rect, Result};
use paintkit_settings::{FillSettings, FillType};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::rc::Rc;

/// State shared by the fill algorithms for the duration of one job.
pub struct FillJobContext {
    pub settings: FillSettings,
    /// Drawable area; fill lines never leave it.
    pub canvas: Rect,
    /// Filled paths still waiting to be filled, in paint order.
    pub layer: WorkLayer,
    adapter: Rc<dyn GeometryAdapter>,
    output: Vec<PlotPath>,
    rng: StdRng,
}

impl FillJobContext {
    pub fn new(
        settings: FillSettings,
        canvas: Rect,
        adapter: Rc<dyn GeometryAdapter>,
        seed: Option<u64>,
    ) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            settings,
            canvas,
            layer: WorkLayer::new("fill"),
            adapter,
            output: Vec::new(),
            rng,
        }
    }

    pub fn adapter(&self) -> Rc<dyn GeometryAdapter> {
        Rc::clone(&self.adapter)
    }

    pub fn rng(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    /// Records a finished polyline. Degenerate ones are dropped.
    pub fn emit(&mut self, path: PlotPath) {
        if path.is_degenerate() {
            tracing::trace!("Dropping degenerate fill segment of '{}'", path.name);
            return;
        }
        self.output.push(path);
    }

    pub fn output(&self) -> &[PlotPath] {
        &self.output
    }

    pub fn take_output(&mut self) -> Vec<PlotPath> {
        std::mem::take(&mut self.output)
    }

    /// Crossing of `from`-`to` with the layer item `target` nearest `near`.
    pub fn closest_intersection(
        &self,
        from: Point,
        to: Point,
        target: PathId,
        near: Point,
    ) -> Option<Point> {
        let path = self.layer.get(target)?;
        adapter::closest_intersection(self.adapter.as_ref(), from, to, path, near)
    }

    /// Drops all scratch geometry and output.
    pub fn reset(&mut self) {
        self.layer.clear();
        self.output.clear();
    }
}

/// The configured fill algorithm.
#[derive(Debug, Clone)]
pub enum FillAlgorithm {
    Line(LineFill),
    Overlay(OverlayFill),
    Pocket(PocketFill),
}

impl FillAlgorithm {
    /// Resolves `fillType` from the context's settings and prepares the
    /// matching algorithm.
    pub fn setup(ctx: &FillJobContext) -> std::result::Result<Self, ConfigError> {
        let fill_type = ctx.settings.resolve_fill_type()?;
        Ok(Self::from_fill_type(fill_type, ctx))
    }

    pub fn from_fill_type(fill_type: FillType, ctx: &FillJobContext) -> Self {
        match fill_type {
            FillType::LineStraight => FillAlgorithm::Line(LineFill::new(LineStyle::Straight)),
            FillType::LineZigzag => FillAlgorithm::Line(LineFill::new(LineStyle::Zigzag)),
            FillType::LineSmooth => FillAlgorithm::Line(LineFill::new(LineStyle::Smooth)),
            FillType::Overlay | FillType::Spiral => {
                FillAlgorithm::Overlay(OverlayFill::new(fill_type, &ctx.settings, ctx.canvas))
            }
            FillType::Cam => FillAlgorithm::Pocket(PocketFill::new()),
        }
    }

    pub fn fill_type(&self) -> FillType {
        match self {
            FillAlgorithm::Line(fill) => fill.style().fill_type(),
            FillAlgorithm::Overlay(fill) => fill.fill_type(),
            FillAlgorithm::Pocket(_) => FillType::Cam,
        }
    }

    /// Every `fillType` this algorithm family handles.
    pub fn provides(&self) -> &'static [FillType] {
        match self {
            FillAlgorithm::Line(_) => &[
                FillType::LineStraight,
                FillType::LineZigzag,
                FillType::LineSmooth,
            ],
            FillAlgorithm::Overlay(_) => &[FillType::Overlay, FillType::Spiral],
            FillAlgorithm::Pocket(_) => &[FillType::Cam],
        }
    }

    /// One quantum of work on `id`.
    ///
    /// Passing a different id than the previous call abandons the old
    /// path and starts on the new one.
    pub fn step(&mut self, ctx: &mut FillJobContext, id: PathId) -> Result<StepResult> {
        match self {
            FillAlgorithm::Line(fill) => fill.step(ctx, id),
            FillAlgorithm::Overlay(fill) => fill.step(ctx, id),
            FillAlgorithm::Pocket(fill) => fill.step(ctx, id),
        }
    }

    /// Clears per-path iteration state.
    pub fn reset(&mut self) {
        match self {
            FillAlgorithm::Line(fill) => fill.reset(),
            FillAlgorithm::Overlay(fill) => fill.reset(),
            FillAlgorithm::Pocket(fill) => fill.reset(),
        }
    }
}

/// Shrinks (positive `distance`) or grows (negative) a filled region.
///
/// Each solid part of the path (an outer ring plus the holes directly
/// inside it) is offset on its own: the outer ring moves inwards, the
/// holes outwards, and the grown holes are cut from the shrunk outer.
/// An empty result means the region vanished; an offset that cannot be
/// computed is a [`GeometryError::Offset`].
pub fn offset_region(
    adapter: &dyn GeometryAdapter,
    path: &ArtPath,
    distance: f64,
) -> Result<Vec<Contour>> {
    if !distance.is_finite() {
        return Err(GeometryError::Offset {
            reason: format!("distance {} for '{}' is not finite", distance, path.name),
        }
        .into());
    }
    let rings: Vec<&Contour> = path.rings().collect();
    let depths: Vec<usize> = (0..rings.len()).map(|i| nesting_depth(&rings, i)).collect();
    let mut out = Vec::new();

    for (i, outer) in rings.iter().enumerate() {
        if depths[i] % 2 != 0 {
            continue;
        }
        let shrunk = offset_ring(adapter, &outer.points, -distance)?;
        if shrunk.is_empty() {
            continue;
        }

        let mut holes = Vec::new();
        for (j, hole) in rings.iter().enumerate() {
            let inside = depths[j] == depths[i] + 1
                && hole
                    .points
                    .first()
                    .is_some_and(|p| ring_contains(&outer.points, *p));
            if inside {
                holes.extend(offset_ring(adapter, &hole.points, distance)?);
            }
        }

        let solid = path.with_geometry(shrunk);
        if holes.is_empty() {
            out.extend(solid.contours().iter().cloned());
            continue;
        }
        let cut = adapter.boolean_difference(&solid, &path.with_geometry(holes))?;
        out.extend(cut.contours().iter().cloned());
    }

    Ok(out)
}

fn offset_ring(
    adapter: &dyn GeometryAdapter,
    ring: &[Point],
    distance: f64,
) -> Result<Vec<Contour>> {
    let rings = adapter.offset_polygon(ring, distance);
    if rings.iter().flatten().any(|p| !p.is_finite()) {
        return Err(GeometryError::Offset {
            reason: "offset produced non-finite coordinates".to_string(),
        }
        .into());
    }
    Ok(rings
        .into_iter()
        .map(|ring| Contour::new(ring, true))
        .filter(Contour::is_ring)
        .collect())
}
