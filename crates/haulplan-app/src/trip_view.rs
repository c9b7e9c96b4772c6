use crate::markers::{MarkerRegistry, SharedMarker};
use crate::reveal::{LegRevealScheduler, RevealProgress, RevealState};
use crate::selection::SelectionBinder;
use crate::viewport::{ViewportControl, ViewportMode, fit_points};
use haulplan_core::{Bounds, LegId, LocationSet, Trip, TripLeg, TripSummary};
use haulplan_events::{Event, EventBus, SelectionOrigin};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// The planned-trip view: progressive reveal, marker handles, selection and
/// the map viewport, kept consistent with each other.
///
/// Auto-fit runs whenever the point set changes (a leg is revealed, a
/// location is set or cleared, the selection is dropped) unless a selected
/// leg currently owns the viewport.
#[derive(Debug)]
pub struct TripVisualizationController {
    trip: Option<Trip>,
    locations: LocationSet,
    reveal: LegRevealScheduler,
    markers: MarkerRegistry,
    selection: SelectionBinder,
    viewport: ViewportControl,
}

impl TripVisualizationController {
    pub fn new(reveal_interval: Duration, fit_padding_px: u32) -> Self {
        Self {
            trip: None,
            locations: LocationSet::default(),
            reveal: LegRevealScheduler::new(reveal_interval),
            markers: MarkerRegistry::new(),
            selection: SelectionBinder::new(),
            viewport: ViewportControl::new(fit_padding_px),
        }
    }

    pub fn trip(&self) -> Option<&Trip> {
        self.trip.as_ref()
    }

    pub fn reveal_state(&self) -> RevealState {
        self.reveal.state()
    }

    pub fn visible_count(&self) -> usize {
        self.reveal.visible()
    }

    pub fn reveal(&self) -> &LegRevealScheduler {
        &self.reveal
    }

    pub fn selected(&self) -> Option<LegId> {
        self.selection.selected()
    }

    pub fn viewport_mode(&self) -> ViewportMode {
        self.viewport.mode()
    }

    pub fn last_fit(&self) -> Option<Bounds> {
        self.viewport.last_fit()
    }

    pub fn markers(&self) -> &MarkerRegistry {
        &self.markers
    }

    pub fn locations(&self) -> &LocationSet {
        &self.locations
    }

    /// Legs the reveal has reached so far, in order.
    pub fn visible_legs(&self) -> &[TripLeg] {
        match &self.trip {
            Some(trip) => &trip.legs[..self.reveal.visible().min(trip.legs.len())],
            None => &[],
        }
    }

    pub fn summary(&self) -> Option<TripSummary> {
        self.trip.as_ref().map(|trip| TripSummary::from_legs(&trip.legs))
    }

    /// Replaces the displayed trip and restarts the reveal from zero.
    pub fn load_trip(&mut self, trip: Trip, now: Instant, bus: &EventBus) {
        self.selection.clear(&self.markers, &mut self.viewport, bus);
        self.markers.clear();

        let id = trip.id;
        let leg_count = trip.len();
        self.trip = Some(trip);
        self.reveal.start(id, leg_count, now);
        info!(trip = %id, leg_count, "trip loaded");

        bus.publish(Event::TripLoaded {
            trip: id,
            leg_count,
        });
        if self.reveal.state() == RevealState::Complete {
            bus.publish(Event::RevealComplete { trip: id });
        }
        self.refit(bus);
    }

    /// Advances the reveal to `now`.
    pub fn poll(&mut self, now: Instant, bus: &EventBus) -> RevealProgress {
        let progress = self.reveal.poll(now);
        if progress.is_empty() {
            return progress;
        }
        if let Some(trip) = self.reveal.trip() {
            for visible in &progress.steps {
                bus.publish(Event::LegRevealed {
                    trip,
                    visible: *visible,
                });
            }
            if progress.completed {
                bus.publish(Event::RevealComplete { trip });
            }
        }
        if !progress.steps.is_empty() {
            self.refit(bus);
        }
        progress
    }

    /// Selects a revealed leg. Returns false for legs the reveal has not
    /// reached or that do not exist.
    pub fn select_leg(&mut self, leg: LegId, origin: SelectionOrigin, bus: &EventBus) -> bool {
        let Some(target) = self.visible_legs().get(leg.0) else {
            debug!(
                %leg,
                visible = self.reveal.visible(),
                "ignoring selection of unrevealed leg"
            );
            return false;
        };
        let target = target.clone();
        self.selection
            .select(&target, origin, &self.markers, &mut self.viewport, bus);
        true
    }

    pub fn clear_selection(&mut self, bus: &EventBus) {
        if self.selection.clear(&self.markers, &mut self.viewport, bus) {
            self.refit(bus);
        }
    }

    pub fn set_locations(&mut self, locations: LocationSet, bus: &EventBus) {
        if self.locations == locations {
            return;
        }
        self.locations = locations;
        self.refit(bus);
    }

    /// Called by the map layer when it renders a marker for `leg`.
    pub fn register_marker(&mut self, leg: LegId, handle: SharedMarker) {
        if self.markers.register(leg, handle).is_some() {
            debug!(%leg, "marker handle replaced");
        }
    }

    pub fn unregister_marker(&mut self, leg: LegId) {
        self.markers.unregister(leg);
    }

    /// Drops the trip and cancels the reveal. Locations are kept.
    pub fn teardown(&mut self, bus: &EventBus) {
        self.selection.clear(&self.markers, &mut self.viewport, bus);
        self.reveal.teardown();
        self.markers.clear();
        if let Some(trip) = self.trip.take() {
            debug!(trip = %trip.id, "trip view torn down");
        }
        self.refit(bus);
    }

    fn refit(&mut self, bus: &EventBus) {
        let points = fit_points(&self.locations, self.visible_legs());
        self.viewport.refit(points, bus);
    }
}
