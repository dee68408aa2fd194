//! Offset (pocket) fill.
//!
//! Concentric rings at `spacing / 2`, `3 * spacing / 2`, ... inside the
//! region, one ring level per step, until the region is used up.

use super::{offset_region, FillJobContext};
use crate::layer::PathId;
use crate::path::{ArtPath, PathRole, PlotPath};
use crate::scheduler::StepResult;
use paintkit_core::Result;

#[derive(Debug, Clone)]
struct PathJob {
    id: PathId,
    /// Flattened at the fill precision.
    region: ArtPath,
    level: usize,
    max_levels: usize,
}

/// Pocket fill state.
#[derive(Debug, Clone, Default)]
pub struct PocketFill {
    job: Option<PathJob>,
}

impl PocketFill {
    pub fn new() -> Self {
        Self::default()
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
        let Some(job) = self.job.as_mut() else {
            return Ok(StepResult::Done);
        };

        let spacing = ctx.settings.fill_spacing;
        let distance = spacing / 2.0 + job.level as f64 * spacing;
        let adapter = ctx.adapter();
        let rings = offset_region(adapter.as_ref(), &job.region, distance)?;

        if rings.is_empty() || job.level >= job.max_levels {
            if job.level == 0 {
                tracing::debug!("'{}' is too small to pocket", job.region.name);
            } else {
                tracing::debug!(
                    "Pocket fill of '{}' complete after {} levels",
                    job.region.name,
                    job.level
                );
            }
            self.job = None;
            return Ok(StepResult::Done);
        }

        for ring in rings {
            ctx.emit(PlotPath::new(
                job.region.name.clone(),
                PathRole::Fill,
                job.region.fill,
                ring.to_polyline(),
            ));
        }
        job.level += 1;
        Ok(StepResult::Continue)
    }

    fn begin(ctx: &FillJobContext, id: PathId) -> Option<PathJob> {
        let source = ctx.layer.get(id)?;
        let adapter = ctx.adapter();
        let contours = adapter.flatten(source.path(), ctx.settings.fill_precision);
        let region = source.with_geometry(contours);
        let bounds = region.bounds()?;
        if region.rings().next().is_none() || ctx.settings.fill_spacing <= 0.0 {
            return None;
        }
        // No ring can survive an offset past half the larger side.
        let max_levels = (bounds.width().max(bounds.height()) / ctx.settings.fill_spacing).ceil()
            as usize
            + 1;
        Some(PathJob {
            id,
            region,
            level: 0,
            max_levels,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::VectorGeometry;
    use paintkit_core::{ColorId, Point, Rect};
    use paintkit_settings::FillSettings;
    use std::rc::Rc;

    fn square(x: f64, y: f64, size: f64) -> Vec<Point> {
        vec![
            Point::new(x, y),
            Point::new(x + size, y),
            Point::new(x + size, y + size),
            Point::new(x, y + size),
        ]
    }

    fn context() -> FillJobContext {
        FillJobContext::new(
            FillSettings {
                fill_type: "cam".to_string(),
                fill_spacing: 10.0,
                ..FillSettings::default()
            },
            Rect::new(0.0, 0.0, 500.0, 500.0),
            Rc::new(VectorGeometry::new()),
            None,
        )
    }

    #[test]
    fn test_pocket_levels() {
        let mut ctx = context();
        let id = ctx
            .layer
            .insert(ArtPath::polygon("sq", square(0.0, 0.0, 100.0)).with_fill(ColorId::Palette(3)));
        let mut fill = PocketFill::new();
        let mut steps = 0;
        while !fill.step(&mut ctx, id).unwrap().is_done() {
            steps += 1;
        }
        // Offsets 5, 15, 25, 35, 45 fit inside a 100 unit square.
        assert_eq!(steps, 5);
        let out = ctx.take_output();
        assert_eq!(out.len(), 5);
        for plot in &out {
            assert_eq!(plot.points.first(), plot.points.last());
            assert_eq!(plot.color, ColorId::Palette(3));
        }
    }

    #[test]
    fn test_too_small_is_dropped() {
        let mut ctx = context();
        let id = ctx
            .layer
            .insert(ArtPath::polygon("tiny", square(0.0, 0.0, 4.0)).with_fill(ColorId::Palette(0)));
        let mut fill = PocketFill::new();
        assert!(fill.step(&mut ctx, id).unwrap().is_done());
        assert!(ctx.output().is_empty());
    }
}
