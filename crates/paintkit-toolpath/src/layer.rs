//! Work layer: an arena of [`ArtPath`]s in paint order.
//!
//! Items are addressed by [`PathId`]. Removing an item frees its slot
//! for reuse; a generation counter keeps stale ids from resolving to
//! the new occupant.

use crate::path::ArtPath;
use paintkit_core::Rect;
use std::fmt;

/// Handle to an item in a [`WorkLayer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PathId {
    index: u32,
    generation: u32,
}

impl fmt::Display for PathId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}v{}", self.index, self.generation)
    }
}

#[derive(Debug, Clone)]
struct Slot {
    generation: u32,
    item: Option<ArtPath>,
}

/// Scratch geometry for one job.
#[derive(Debug, Clone, Default)]
pub struct WorkLayer {
    name: String,
    slots: Vec<Slot>,
    free: Vec<u32>,
    /// Bottom to top.
    order: Vec<PathId>,
}

impl WorkLayer {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Adds `path` on top of everything already in the layer.
    pub fn insert(&mut self, path: ArtPath) -> PathId {
        let id = match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.generation = slot.generation.wrapping_add(1);
                slot.item = Some(path);
                PathId {
                    index,
                    generation: slot.generation,
                }
            }
            None => {
                let index = self.slots.len() as u32;
                self.slots.push(Slot {
                    generation: 0,
                    item: Some(path),
                });
                PathId {
                    index,
                    generation: 0,
                }
            }
        };
        self.order.push(id);
        id
    }

    fn slot(&self, id: PathId) -> Option<&Slot> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
    }

    pub fn get(&self, id: PathId) -> Option<&ArtPath> {
        self.slot(id).and_then(|slot| slot.item.as_ref())
    }

    pub fn get_mut(&mut self, id: PathId) -> Option<&mut ArtPath> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.item.as_mut())
    }

    pub fn contains(&self, id: PathId) -> bool {
        self.get(id).is_some()
    }

    /// Swaps the geometry of `id` in place, keeping its stacking position.
    pub fn replace(&mut self, id: PathId, path: ArtPath) -> Option<ArtPath> {
        self.get_mut(id).map(|item| std::mem::replace(item, path))
    }

    /// Removes `id`, freeing its slot.
    pub fn remove(&mut self, id: PathId) -> Option<ArtPath> {
        let slot = self
            .slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)?;
        let item = slot.item.take()?;
        self.free.push(id.index);
        self.order.retain(|other| *other != id);
        Some(item)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Empties the layer. Slots keep their generations so ids handed out
    /// before the clear never resolve to later items.
    pub fn clear(&mut self) {
        for slot in &mut self.slots {
            slot.item = None;
        }
        self.free = (0..self.slots.len() as u32).rev().collect();
        self.order.clear();
    }

    /// Ids in paint order, bottom first.
    pub fn ids(&self) -> &[PathId] {
        &self.order
    }

    pub fn bottom(&self) -> Option<PathId> {
        self.order.first().copied()
    }

    /// Stacking position of `id`, 0 being the bottom.
    pub fn position(&self, id: PathId) -> Option<usize> {
        self.order.iter().position(|other| *other == id)
    }

    /// Items bottom first.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (PathId, &ArtPath)> + '_ {
        self.order
            .iter()
            .filter_map(move |id| self.get(*id).map(|item| (*id, item)))
    }

    /// Items top first, the order hit tests walk.
    pub fn iter_top_down(&self) -> impl Iterator<Item = (PathId, &ArtPath)> + '_ {
        self.iter().rev()
    }

    pub fn bounds(&self) -> Option<Rect> {
        self.iter()
            .filter_map(|(_, item)| item.bounds())
            .reduce(|a, b| a.union(&b))
    }
}
