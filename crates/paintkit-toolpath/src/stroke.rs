//! Stroke tracer.
//!
//! Every visible path is copied into a scratch layer. Paths with an
//! outline to paint are then walked along their length, bottom first,
//! one sample per step. A sample is kept while a hit test at that point
//! still finds the path being traced; anything above it in the scratch
//! layer breaks the trace. A traced path is removed from the layer once
//! finished, so it never hides the strokes of paths below it.

use crate::adapter::{closest_intersection, GeometryAdapter, HitOptions};
use crate::layer::{PathId, WorkLayer};
use crate::path::{ArtPath, PathRole, PlotPath};
use crate::scheduler::StepResult;
use paintkit_core::{ColorId, Point};
use paintkit_settings::StrokeSettings;
use std::collections::VecDeque;
use std::rc::Rc;

#[derive(Debug, Clone)]
struct Cursor {
    id: PathId,
    contour: usize,
    distance: f64,
    total: f64,
    /// Previous sample and the topmost item found there.
    prev: Option<(Point, Option<PathId>)>,
    trace: Vec<Point>,
}

/// Incremental outline tracer.
pub struct StrokeTracer {
    settings: StrokeSettings,
    adapter: Rc<dyn GeometryAdapter>,
    layer: WorkLayer,
    pending: VecDeque<PathId>,
    cursor: Option<Cursor>,
    output: Vec<PlotPath>,
}

impl StrokeTracer {
    pub fn new(settings: StrokeSettings, adapter: Rc<dyn GeometryAdapter>) -> Self {
        Self {
            settings,
            adapter,
            layer: WorkLayer::new("stroke"),
            pending: VecDeque::new(),
            cursor: None,
            output: Vec::new(),
        }
    }

    /// Copies `paths` (bottom first) into the scratch layer.
    ///
    /// Blank paths are dropped. Filled paths are closed so their outline
    /// encloses the fill. Paths with nothing to trace stay in the layer
    /// as occluders only.
    pub fn setup(&mut self, paths: &[ArtPath]) {
        self.reset();
        for path in paths {
            if path.is_empty() || (!path.has_fill() && !path.has_stroke()) {
                tracing::trace!("Skipping blank path '{}'", path.name);
                continue;
            }
            let mut copy = if path.has_fill() {
                path.closed()
            } else {
                path.clone()
            };
            let color = self.trace_color(path);
            if let Some(color) = color {
                copy.stroke = color;
            }
            let id = self.layer.insert(copy);
            if color.is_some() {
                self.pending.push_back(id);
            }
        }
        tracing::debug!(
            "Stroke tracer prepared {} outlines ({} items in scratch layer)",
            self.pending.len(),
            self.layer.len()
        );
    }

    fn trace_color(&self, path: &ArtPath) -> Option<ColorId> {
        if path.has_stroke() {
            Some(path.stroke)
        } else if self.settings.trace_fill_outlines && path.has_fill() {
            Some(path.fill)
        } else {
            None
        }
    }

    /// Outlines still waiting to be traced, including the current one.
    pub fn remaining(&self) -> usize {
        self.pending.len()
    }

    pub fn is_done(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn output(&self) -> &[PlotPath] {
        &self.output
    }

    pub fn take_output(&mut self) -> Vec<PlotPath> {
        std::mem::take(&mut self.output)
    }

    pub fn reset(&mut self) {
        self.layer.clear();
        self.pending.clear();
        self.cursor = None;
        self.output.clear();
    }

    /// Traces one sample of the current outline.
    pub fn step(&mut self) -> StepResult {
        let Some(&id) = self.pending.front() else {
            return StepResult::Done;
        };
        let Some(item) = self.layer.get(id).cloned() else {
            self.pending.pop_front();
            return self.progress();
        };

        let precision = self.settings.stroke_precision.max(0.01);
        let mut cursor = match self.cursor.take() {
            Some(cursor) if cursor.id == id => cursor,
            _ => match self.start_contour(&item, id, 0) {
                Some(cursor) => cursor,
                None => return self.finish_path(id, &item),
            },
        };

        let Some(contour) = item.contours().get(cursor.contour) else {
            return self.finish_path(id, &item);
        };
        let Some(p) = contour.point_at_length(cursor.distance) else {
            return self.finish_path(id, &item);
        };

        let options = HitOptions {
            fill: true,
            stroke: true,
            tolerance: precision / 2.0,
        };
        let hit = self.adapter.hit_test(&self.layer, p, &options);
        let visible = hit == Some(id);

        match (cursor.prev, visible) {
            (Some((from, Some(cover))), true) if cover != id => {
                let snap = self.layer.get(cover).and_then(|occluder| {
                    closest_intersection(self.adapter.as_ref(), from, p, occluder, p)
                });
                cursor.trace.extend(snap);
                cursor.trace.push(p);
            }
            (_, true) => cursor.trace.push(p),
            (Some((from, _)), false) if !cursor.trace.is_empty() => {
                let snap = hit
                    .and_then(|cover| self.layer.get(cover))
                    .and_then(|occluder| {
                        closest_intersection(self.adapter.as_ref(), from, p, occluder, from)
                    });
                cursor.trace.extend(snap);
                self.flush(&item, &mut cursor.trace);
            }
            _ => {}
        }
        cursor.prev = Some((p, hit));

        if cursor.distance >= cursor.total {
            self.flush(&item, &mut cursor.trace);
            let next = cursor.contour + 1;
            match self.start_contour(&item, id, next) {
                Some(next_cursor) => self.cursor = Some(next_cursor),
                None => return self.finish_path(id, &item),
            }
        } else {
            cursor.distance = (cursor.distance + precision).min(cursor.total);
            self.cursor = Some(cursor);
        }
        StepResult::Continue
    }

    /// Cursor at the start of the first traceable contour at or after
    /// `index`.
    fn start_contour(&self, item: &ArtPath, id: PathId, index: usize) -> Option<Cursor> {
        item.contours()
            .iter()
            .enumerate()
            .skip(index)
            .find(|(_, c)| c.points.len() >= 2 && c.length() > 0.0)
            .map(|(i, contour)| {
                let length = contour.length();
                let total = if contour.closed {
                    length + self.settings.stroke_overshoot.clamp(0.0, length)
                } else {
                    length
                };
                Cursor {
                    id,
                    contour: i,
                    distance: 0.0,
                    total,
                    prev: None,
                    trace: Vec::new(),
                }
            })
    }

    fn flush(&mut self, item: &ArtPath, trace: &mut Vec<Point>) {
        let points = std::mem::take(trace);
        if points.len() < 2 {
            return;
        }
        let plot = PlotPath::new(item.name.clone(), PathRole::Stroke, item.stroke, points);
        if !plot.is_degenerate() {
            self.output.push(plot);
        }
    }

    fn finish_path(&mut self, id: PathId, item: &ArtPath) -> StepResult {
        tracing::debug!("Stroke of '{}' traced", item.name);
        self.cursor = None;
        self.layer.remove(id);
        self.pending.pop_front();
        self.progress()
    }

    fn progress(&self) -> StepResult {
        if self.pending.is_empty() {
            StepResult::Done
        } else {
            StepResult::Continue
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::VectorGeometry;

    fn square(x: f64, y: f64, size: f64) -> Vec<Point> {
        vec![
            Point::new(x, y),
            Point::new(x + size, y),
            Point::new(x + size, y + size),
            Point::new(x, y + size),
        ]
    }

    fn tracer(settings: StrokeSettings) -> StrokeTracer {
        StrokeTracer::new(settings, Rc::new(VectorGeometry::new()))
    }

    fn run(tracer: &mut StrokeTracer) -> usize {
        let mut steps = 0;
        while !tracer.step().is_done() {
            steps += 1;
            assert!(steps < 100_000, "stroke tracer did not terminate");
        }
        steps
    }

    #[test]
    fn test_unobstructed_outline_with_overshoot() {
        let mut t = tracer(StrokeSettings {
            stroke_precision: 2.0,
            stroke_overshoot: 5.0,
            trace_fill_outlines: false,
        });
        t.setup(&[
            ArtPath::polygon("sq", square(0.0, 0.0, 40.0)).with_stroke(ColorId::Palette(0), 1.0)
        ]);
        run(&mut t);
        let out = t.take_output();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].role, PathRole::Stroke);
        assert!((out[0].length() - 165.0).abs() < 1e-6);
    }

    #[test]
    fn test_fill_above_breaks_stroke() {
        let mut t = tracer(StrokeSettings::default());
        t.setup(&[
            ArtPath::polyline("line", vec![Point::new(0.0, 50.0), Point::new(100.0, 50.0)])
                .with_stroke(ColorId::Palette(1), 1.0),
            ArtPath::polygon("cover", square(40.0, 40.0, 20.0)).with_fill(ColorId::Palette(2)),
        ]);
        run(&mut t);
        let out = t.take_output();
        assert_eq!(out.len(), 2);
        let left = &out[0];
        let right = &out[1];
        assert!((left.end().unwrap().x - 40.0).abs() < 1e-6);
        assert!((right.start().unwrap().x - 60.0).abs() < 1e-6);
    }

    #[test]
    fn test_blank_and_fill_only_paths() {
        let mut t = tracer(StrokeSettings::default());
        t.setup(&[
            ArtPath::polygon("blank", square(0.0, 0.0, 10.0)),
            ArtPath::polygon("filled", square(20.0, 0.0, 10.0)).with_fill(ColorId::Palette(0)),
        ]);
        assert!(t.is_done());
        assert_eq!(t.step(), StepResult::Done);

        let mut t = tracer(StrokeSettings {
            trace_fill_outlines: true,
            ..StrokeSettings::default()
        });
        t.setup(&[
            ArtPath::polygon("filled", square(20.0, 0.0, 10.0)).with_fill(ColorId::Palette(5))
        ]);
        assert_eq!(t.remaining(), 1);
        run(&mut t);
        assert!(t.output().iter().all(|p| p.color == ColorId::Palette(5)));
        assert!(!t.output().is_empty());
    }

    #[test]
    fn test_compound_path_traces_each_contour() {
        let mut t = tracer(StrokeSettings::default());
        let pair = ArtPath::from_contours(
            "pair",
            vec![
                crate::path::Contour::new(square(0.0, 0.0, 10.0), true),
                crate::path::Contour::new(square(30.0, 0.0, 10.0), true),
            ],
        )
        .with_stroke(ColorId::Palette(0), 1.0);
        t.setup(&[pair]);
        run(&mut t);
        assert_eq!(t.output().len(), 2);
    }
}
