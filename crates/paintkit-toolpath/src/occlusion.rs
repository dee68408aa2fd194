//! Occlusion resolver.
//!
//! Paint goes down bottom to top, so a shape only shows where nothing
//! above it covers it. Each filled path is replaced by itself minus
//! every path stacked above it; fully covered paths are dropped.

use crate::adapter::GeometryAdapter;
use crate::layer::{PathId, WorkLayer};
use crate::scheduler::StepResult;

/// Incremental resolver, one source path per step.
#[derive(Debug, Clone, Default)]
pub struct OcclusionResolver {
    ids: Vec<PathId>,
    next: usize,
    dropped: usize,
}

impl OcclusionResolver {
    /// Snapshots the stacking order of `layer`.
    pub fn new(layer: &WorkLayer) -> Self {
        Self {
            ids: layer.ids().to_vec(),
            next: 0,
            dropped: 0,
        }
    }

    /// Paths removed so far because nothing of them stayed visible.
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    pub fn is_done(&self) -> bool {
        self.next >= self.ids.len()
    }

    /// Subtracts everything above the next source path from it.
    pub fn step(&mut self, adapter: &dyn GeometryAdapter, layer: &mut WorkLayer) -> StepResult {
        let Some(&source) = self.ids.get(self.next) else {
            return StepResult::Done;
        };
        self.next += 1;

        if let Some(mut remainder) = layer.get(source).cloned() {
            for &above in &self.ids[self.next..] {
                let Some(cover) = layer.get(above) else {
                    continue;
                };
                match adapter.boolean_difference(&remainder, cover) {
                    Ok(result) => remainder = result,
                    Err(e) => {
                        tracing::warn!(
                            "Occlusion of '{}' by '{}' failed, keeping it: {}",
                            remainder.name,
                            cover.name,
                            e
                        );
                    }
                }
                if remainder.rings().next().is_none() {
                    break;
                }
            }

            if remainder.rings().next().is_none() {
                tracing::debug!("'{}' is fully occluded, dropping it", remainder.name);
                layer.remove(source);
                self.dropped += 1;
            } else {
                layer.replace(source, remainder);
            }
        }

        if self.is_done() {
            StepResult::Done
        } else {
            StepResult::Continue
        }
    }
}

/// Resolves a whole layer in one go.
pub fn resolve_occlusion(adapter: &dyn GeometryAdapter, layer: &mut WorkLayer) -> usize {
    let mut resolver = OcclusionResolver::new(layer);
    while !resolver.step(adapter, layer).is_done() {}
    resolver.dropped()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::VectorGeometry;
    use crate::path::ArtPath;
    use paintkit_core::{ColorId, Point};

    fn square(x: f64, y: f64, size: f64) -> Vec<Point> {
        vec![
            Point::new(x, y),
            Point::new(x + size, y),
            Point::new(x + size, y + size),
            Point::new(x, y + size),
        ]
    }

    #[test]
    fn test_fully_covered_path_is_dropped() {
        let geo = VectorGeometry::new();
        let mut layer = WorkLayer::new("fills");
        layer.insert(
            ArtPath::polygon("small", square(2.0, 2.0, 4.0)).with_fill(ColorId::Palette(0)),
        );
        layer.insert(
            ArtPath::polygon("big", square(0.0, 0.0, 10.0)).with_fill(ColorId::Palette(1)),
        );

        let dropped = resolve_occlusion(&geo, &mut layer);
        assert_eq!(dropped, 1);
        assert_eq!(layer.len(), 1);
        let (_, remaining) = layer.iter().next().unwrap();
        assert_eq!(remaining.name, "big");
    }

    #[test]
    fn test_top_path_is_untouched() {
        let geo = VectorGeometry::new();
        let mut layer = WorkLayer::new("fills");
        let bottom = layer.insert(
            ArtPath::polygon("bottom", square(0.0, 0.0, 10.0)).with_fill(ColorId::Palette(0)),
        );
        let top = layer.insert(
            ArtPath::polygon("top", square(5.0, 5.0, 10.0)).with_fill(ColorId::Palette(1)),
        );

        let mut resolver = OcclusionResolver::new(&layer);
        assert_eq!(resolver.step(&geo, &mut layer), StepResult::Continue);
        assert_eq!(resolver.step(&geo, &mut layer), StepResult::Done);

        assert!((layer.get(bottom).unwrap().area() - 75.0).abs() < 1e-6);
        assert!((layer.get(top).unwrap().area() - 100.0).abs() < 1e-6);
        assert_eq!(layer.get(bottom).unwrap().fill, ColorId::Palette(0));
    }
}
