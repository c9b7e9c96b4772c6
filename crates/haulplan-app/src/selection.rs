use crate::markers::MarkerRegistry;
use crate::viewport::ViewportControl;
use haulplan_core::{LegId, TripLeg};
use haulplan_events::{Event, EventBus, SelectionOrigin};
use tracing::debug;

/// Sole owner of "which leg is selected".
///
/// Selecting fans out to the marker popups, the leg list and the map, and
/// locks the viewport to the selection. The same leg selected from the list
/// or from the map ends in the same state.
#[derive(Debug, Default)]
pub struct SelectionBinder {
    selected: Option<LegId>,
}

impl SelectionBinder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected(&self) -> Option<LegId> {
        self.selected
    }

    pub fn select(
        &mut self,
        leg: &TripLeg,
        origin: SelectionOrigin,
        registry: &MarkerRegistry,
        viewport: &mut ViewportControl,
        bus: &EventBus,
    ) {
        registry.close_all();

        self.selected = Some(leg.id);
        viewport.lock(leg.id);

        let handle = registry.get(leg.id);
        if leg.leg_type.has_marker() {
            if let Some(handle) = &handle {
                handle.open_popup();
            }
        }

        let center = handle
            .as_ref()
            .and_then(|h| h.position())
            .or_else(|| leg.marker_position());

        debug!(leg = %leg.id, ?origin, ?center, "leg selected");
        bus.publish(Event::LegHighlight { leg: Some(leg.id) });
        bus.publish(Event::LegListScrollTo { leg: leg.id });
        if let Some(center) = center {
            bus.publish(Event::MapPanTo { center });
        }
        bus.publish(Event::LegSelected {
            leg: leg.id,
            origin,
        });
    }

    /// Drops the selection, closes popups and hands the viewport back to auto-fit.
    /// Returns false if nothing was selected.
    pub fn clear(
        &mut self,
        registry: &MarkerRegistry,
        viewport: &mut ViewportControl,
        bus: &EventBus,
    ) -> bool {
        let Some(previous) = self.selected.take() else {
            return false;
        };
        registry.close_all();
        viewport.unlock();
        debug!(leg = %previous, "selection cleared");
        bus.publish(Event::LegHighlight { leg: None });
        bus.publish(Event::SelectionCleared);
        true
    }

    /// Forget the selection without publishing anything, for trip replacement.
    pub fn reset(&mut self, viewport: &mut ViewportControl) {
        self.selected = None;
        viewport.unlock();
    }
}
