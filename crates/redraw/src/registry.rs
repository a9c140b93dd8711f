//! Shapes tracked by the redraw scheduler.
//!
//! The registry holds non-owning references keyed by [`ShapeId`], in
//! insertion order. Owners keep their `Arc<Shape>`; once they drop it the
//! shape is skipped during passes and swept out by a later insertion.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use canvas_core::{Shape, ShapeId};
use indexmap::IndexMap;

/// Outcome of one registry traversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Traversal {
    /// Shapes handed to the visitor.
    pub visited: usize,
    /// Whether the traversal stopped early on a cancellation check.
    pub cancelled: bool,
}

/// Entry count below which dead entries are never swept.
const MIN_PRUNE_LEN: usize = 64;

#[derive(Debug)]
struct Entries {
    map: IndexMap<ShapeId, Weak<Shape>>,
    /// Sweep dead entries once the map grows to this length.
    prune_at: usize,
}

impl Default for Entries {
    fn default() -> Self {
        Self {
            map: IndexMap::new(),
            prune_at: MIN_PRUNE_LEN,
        }
    }
}

impl Entries {
    /// Drop dead entries and push the next sweep out to twice the live
    /// count, so sweeps stay amortized O(1) per insertion.
    fn prune_if_due(&mut self) {
        if self.map.len() < self.prune_at {
            return;
        }
        self.map.retain(|_, weak| weak.strong_count() > 0);
        self.prune_at = (self.map.len() * 2).max(MIN_PRUNE_LEN);
    }
}

#[derive(Debug, Default)]
pub struct ShapeRegistry {
    shapes: Mutex<Entries>,
}

impl ShapeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    // A strategy that panics mid-pass poisons this lock. The map itself is
    // never left half-updated, so the poison is ignored.
    fn entries(&self) -> MutexGuard<'_, Entries> {
        self.shapes.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Track `shape`. Returns `false` if it was already tracked.
    pub fn add(&self, shape: &Arc<Shape>) -> bool {
        let mut entries = self.entries();
        if entries.map.contains_key(&shape.id()) {
            return false;
        }
        entries.prune_if_due();
        entries.map.insert(shape.id(), Arc::downgrade(shape));
        true
    }

    pub fn contains(&self, id: &ShapeId) -> bool {
        self.entries()
            .map
            .get(id)
            .is_some_and(|weak| weak.strong_count() > 0)
    }

    /// Number of tracked shapes still alive.
    pub fn len(&self) -> usize {
        self.entries()
            .map
            .values()
            .filter(|weak| weak.strong_count() > 0)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Live shapes in insertion order.
    pub fn snapshot(&self) -> Vec<Arc<Shape>> {
        self.entries().map.values().filter_map(Weak::upgrade).collect()
    }

    /// Visit every live shape in insertion order, holding the registry lock
    /// for the whole traversal. `is_cancelled` is polled before each shape;
    /// the first visitor error ends the traversal and is returned.
    pub fn for_each<E>(
        &self,
        mut visit: impl FnMut(&Shape) -> Result<(), E>,
        is_cancelled: impl Fn() -> bool,
    ) -> Result<Traversal, E> {
        let entries = self.entries();
        let mut traversal = Traversal::default();
        for weak in entries.map.values() {
            if is_cancelled() {
                traversal.cancelled = true;
                break;
            }
            let Some(shape) = weak.upgrade() else {
                continue;
            };
            visit(&*shape)?;
            traversal.visited += 1;
        }
        Ok(traversal)
    }
}
