use haulplan_core::{Bounds, Coord, LegId, LocationSet, TripLeg, compute_bounds};
use haulplan_events::{Event, EventBus};
use tracing::debug;

/// Who drives the map viewport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewportMode {
    /// Fit to every visible point whenever the point set changes.
    AutoFit,
    /// A selected leg owns the viewport; point-set changes do not refit.
    SelectionLocked(LegId),
}

#[derive(Debug)]
pub struct ViewportControl {
    mode: ViewportMode,
    padding_px: u32,
    last_fit: Option<Bounds>,
}

impl ViewportControl {
    pub fn new(padding_px: u32) -> Self {
        Self {
            mode: ViewportMode::AutoFit,
            padding_px,
            last_fit: None,
        }
    }

    pub fn mode(&self) -> ViewportMode {
        self.mode
    }

    pub fn last_fit(&self) -> Option<Bounds> {
        self.last_fit
    }

    pub fn lock(&mut self, leg: LegId) {
        if self.mode != ViewportMode::SelectionLocked(leg) {
            debug!(%leg, "viewport locked to selection");
        }
        self.mode = ViewportMode::SelectionLocked(leg);
    }

    pub fn unlock(&mut self) {
        if self.mode != ViewportMode::AutoFit {
            debug!("viewport back to auto-fit");
        }
        self.mode = ViewportMode::AutoFit;
    }

    /// Fits the map to `points` when in auto-fit mode. Returns the bounds that
    /// were published, or `None` when locked or when there was nothing to fit.
    pub fn refit<I>(&mut self, points: I, bus: &EventBus) -> Option<Bounds>
    where
        I: IntoIterator<Item = Coord>,
    {
        if self.mode != ViewportMode::AutoFit {
            return None;
        }
        let bounds = compute_bounds(points)?;
        self.last_fit = Some(bounds);
        bus.publish(Event::MapFitBounds {
            bounds,
            padding_px: self.padding_px,
        });
        Some(bounds)
    }
}

/// The auto-fit point set: committed locations plus the geometry of revealed legs.
pub fn fit_points(locations: &LocationSet, visible_legs: &[TripLeg]) -> Vec<Coord> {
    let mut points = locations.coords();
    points.extend(
        visible_legs
            .iter()
            .flat_map(|leg| leg.polyline_geometry.iter().copied()),
    );
    points
}
