use haulplan_core::{Coord, LegId};
use std::collections::HashMap;
use std::rc::Rc;

/// A live marker owned by the map layer.
///
/// Handles can go stale once the map stops rendering their leg; a stale handle
/// should answer `position() == None` and treat popup calls as no-ops.
pub trait MarkerHandle {
    fn open_popup(&self);
    fn close_popup(&self);
    fn position(&self) -> Option<Coord>;
}

pub type SharedMarker = Rc<dyn MarkerHandle>;

/// Leg id to marker handle, last writer wins per id.
///
/// The registry only maps; it never creates or destroys handles. All access
/// happens on the UI loop, so there is no locking.
#[derive(Default)]
pub struct MarkerRegistry {
    handles: HashMap<LegId, SharedMarker>,
}

impl std::fmt::Debug for MarkerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut ids: Vec<_> = self.handles.keys().copied().collect();
        ids.sort();
        f.debug_struct("MarkerRegistry").field("legs", &ids).finish()
    }
}

impl MarkerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `handle` for `leg`, returning the handle it replaced.
    pub fn register(&mut self, leg: LegId, handle: SharedMarker) -> Option<SharedMarker> {
        self.handles.insert(leg, handle)
    }

    pub fn unregister(&mut self, leg: LegId) -> Option<SharedMarker> {
        self.handles.remove(&leg)
    }

    pub fn get(&self, leg: LegId) -> Option<SharedMarker> {
        self.handles.get(&leg).cloned()
    }

    pub fn contains(&self, leg: LegId) -> bool {
        self.handles.contains_key(&leg)
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    pub fn close_all(&self) {
        for handle in self.handles.values() {
            handle.close_popup();
        }
    }

    pub fn clear(&mut self) {
        self.handles.clear();
    }
}
