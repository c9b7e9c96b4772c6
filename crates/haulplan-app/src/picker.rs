use crate::dispatch::Ticket;
use crate::geocode::{GeocodeSearchController, SearchRequest, reverse_label};
use crate::geolocation::GeolocationError;
use haulplan_api::{ApiError, ReverseGeocodeResult, SearchResult};
use haulplan_core::{Coord, GeoPoint, LocationRole};
use haulplan_events::{Event, EventBus, telemetry};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Reverse geocode the picker is waiting on before it can commit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReverseRequest {
    pub ticket: Ticket,
    pub center: Coord,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Lookup {
    Geolocation(Ticket),
    Reverse(ReverseRequest),
}

#[derive(Debug, Clone, PartialEq)]
struct Drawer {
    role: LocationRole,
    draft_center: Coord,
    lookup: Option<Lookup>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickerState {
    Closed,
    Open(LocationRole),
}

/// Drawer workflow for placing one of the three trip locations.
///
/// `Closed -> Open(role)`, then either `cancel` back to closed or `confirm`,
/// which reverse geocodes the draft center and commits a [`GeoPoint`] for
/// the role. Opening another role discards the current draft and anything
/// it was waiting on.
#[derive(Debug)]
pub struct LocationPickerWorkflow {
    drawer: Option<Drawer>,
    search: GeocodeSearchController,
    default_center: Coord,
}

impl LocationPickerWorkflow {
    pub fn new(search: GeocodeSearchController, default_center: Coord) -> Self {
        Self {
            drawer: None,
            search,
            default_center,
        }
    }

    pub fn state(&self) -> PickerState {
        match &self.drawer {
            Some(drawer) => PickerState::Open(drawer.role),
            None => PickerState::Closed,
        }
    }

    pub fn draft_center(&self) -> Option<Coord> {
        self.drawer.as_ref().map(|d| d.draft_center)
    }

    /// True while a geolocation or reverse geocode for the draft is outstanding.
    pub fn is_busy(&self) -> bool {
        self.drawer.as_ref().is_some_and(|d| d.lookup.is_some())
    }

    pub fn search(&self) -> &GeocodeSearchController {
        &self.search
    }

    pub fn open(&mut self, role: LocationRole, existing: Option<&GeoPoint>, bus: &EventBus) {
        let draft_center = existing
            .map(GeoPoint::coord)
            .filter(Coord::is_finite)
            .unwrap_or(self.default_center);
        if let Some(previous) = self.drawer.take() {
            debug!(previous = previous.role.as_str(), "discarding open draft");
        }
        self.search.clear();
        self.drawer = Some(Drawer {
            role,
            draft_center,
            lookup: None,
        });
        debug!(role = role.as_str(), center = %draft_center, "picker opened");
        bus.publish(Event::DrawerOpened {
            role,
            center: draft_center,
        });
    }

    pub fn cancel(&mut self, bus: &EventBus) -> bool {
        if self.drawer.take().is_none() {
            return false;
        }
        self.search.clear();
        bus.publish(Event::DrawerClosed);
        true
    }

    /// Map drag finished; the draft follows the map center.
    pub fn move_end(&mut self, center: Coord) {
        if !center.is_finite() {
            return;
        }
        if let Some(drawer) = &mut self.drawer {
            drawer.draft_center = center;
        }
    }

    pub fn query_changed(&mut self, text: impl Into<String>, now: Instant) {
        if self.drawer.is_some() {
            self.search.on_query_changed(text, now);
        }
    }

    pub fn poll(&mut self, now: Instant) -> Option<SearchRequest> {
        self.drawer.as_ref()?;
        self.search.poll(now)
    }

    pub fn on_search_response(
        &mut self,
        ticket: Ticket,
        result: Result<Vec<SearchResult>, ApiError>,
        bus: &EventBus,
    ) -> bool {
        self.search.on_response(ticket, result, bus)
    }

    /// Moves the draft to a search candidate without committing it.
    pub fn choose_result(&mut self, index: usize, bus: &EventBus) -> bool {
        let Some(drawer) = &mut self.drawer else {
            return false;
        };
        let Some(center) = self.search.results().get(index).and_then(SearchResult::coord) else {
            warn!(index, "search result has no usable coordinates");
            return false;
        };
        drawer.draft_center = center;
        self.search.clear();
        bus.publish(Event::MapPanTo { center });
        true
    }

    /// Starts committing the draft center. The drawer stays open until the
    /// reverse geocode comes back. Returns `None` when closed or when a
    /// lookup for this draft is already outstanding.
    pub fn confirm(&mut self) -> Option<ReverseRequest> {
        let drawer = self.drawer.as_mut()?;
        if drawer.lookup.is_some() {
            debug!(role = drawer.role.as_str(), "confirm ignored, lookup pending");
            return None;
        }
        let request = ReverseRequest {
            ticket: Ticket::next(),
            center: drawer.draft_center,
        };
        drawer.lookup = Some(Lookup::Reverse(request));
        Some(request)
    }

    /// Finishes a confirm and closes the drawer. Reverse geocode failures
    /// still produce a point, under the fallback label. The caller announces
    /// `LocationCommitted` once the point has actually been stored.
    pub fn on_reverse(
        &mut self,
        ticket: Ticket,
        result: Result<ReverseGeocodeResult, ApiError>,
        bus: &EventBus,
    ) -> Option<(LocationRole, GeoPoint)> {
        let Some(Lookup::Reverse(pending)) = self.drawer.as_ref().and_then(|d| d.lookup) else {
            telemetry::stale_completion(telemetry::REQ_GEOCODE_REVERSE, ticket.get());
            return None;
        };
        if pending.ticket != ticket {
            telemetry::stale_completion(telemetry::REQ_GEOCODE_REVERSE, ticket.get());
            return None;
        }
        let drawer = self.drawer.take()?;
        self.search.clear();

        let point = GeoPoint::at(reverse_label(&result), pending.center);
        info!(role = drawer.role.as_str(), label = %point.label, "location picked");
        bus.publish(Event::DrawerClosed);
        Some((drawer.role, point))
    }

    /// Asks the platform for the device position. Only the current-location
    /// role offers this shortcut.
    pub fn use_device_location(&mut self, bus: &EventBus) -> Option<Ticket> {
        let drawer = self.drawer.as_mut()?;
        if drawer.role != LocationRole::Current {
            bus.warn("Device location is only available for the current location.");
            return None;
        }
        if drawer.lookup.is_some() {
            debug!("device location ignored, lookup pending");
            return None;
        }
        let ticket = Ticket::next();
        drawer.lookup = Some(Lookup::Geolocation(ticket));
        Some(ticket)
    }

    /// On success the draft jumps to the device position and a reverse
    /// geocode is requested, exactly as if the user had confirmed there.
    /// On failure the drawer stays open for manual placement.
    pub fn on_geolocation(
        &mut self,
        ticket: Ticket,
        result: Result<Coord, GeolocationError>,
        bus: &EventBus,
    ) -> Option<ReverseRequest> {
        let drawer = self.drawer.as_mut()?;
        if drawer.lookup != Some(Lookup::Geolocation(ticket)) {
            telemetry::stale_completion(telemetry::REQ_GEOLOCATE, ticket.get());
            return None;
        }
        match result {
            Ok(center) if center.is_finite() => {
                drawer.draft_center = center;
                let request = ReverseRequest {
                    ticket: Ticket::next(),
                    center,
                };
                drawer.lookup = Some(Lookup::Reverse(request));
                bus.publish(Event::MapPanTo { center });
                Some(request)
            }
            Ok(_) => {
                drawer.lookup = None;
                bus.error(GeolocationError::Unavailable.user_message());
                None
            }
            Err(error) => {
                warn!(%error, "device location failed");
                drawer.lookup = None;
                bus.error(error.user_message());
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    const WINDOW: Duration = Duration::from_millis(1200);
    const CENTER: Coord = Coord {
        lat: 39.8283,
        lon: -98.5795,
    };

    fn picker() -> LocationPickerWorkflow {
        LocationPickerWorkflow::new(GeocodeSearchController::new(WINDOW, 3), CENTER)
    }

    #[test]
    fn open_seeds_from_existing_or_default_without_searching() {
        let mut picker = picker();
        let bus = EventBus::new();
        picker.open(LocationRole::Pickup, None, &bus);
        assert_eq!(picker.draft_center(), Some(CENTER));
        assert_eq!(picker.poll(Instant::now() + WINDOW * 2), None);

        let existing = GeoPoint::new("B", 40.0, -76.0);
        picker.open(LocationRole::Pickup, Some(&existing), &bus);
        assert_eq!(picker.draft_center(), Some(Coord::new(40.0, -76.0)));
    }

    #[test]
    fn confirm_commits_reverse_label_at_draft_center() {
        let mut picker = picker();
        let bus = EventBus::new();
        picker.open(LocationRole::Dropoff, None, &bus);
        picker.move_end(Coord::new(41.0, -75.0));
        let req = picker.confirm().unwrap();
        assert!(picker.is_busy());
        assert_eq!(picker.confirm(), None);

        let committed = picker.on_reverse(
            req.ticket,
            Ok(ReverseGeocodeResult {
                display_name: Some("C".into()),
            }),
            &bus,
        );
        assert_eq!(
            committed,
            Some((LocationRole::Dropoff, GeoPoint::new("C", 41.0, -75.0)))
        );
        assert_eq!(picker.state(), PickerState::Closed);
        assert_eq!(bus.drain().last(), Some(&Event::DrawerClosed));
    }

    #[test]
    fn reverse_failure_commits_fallback_label_with_same_coords() {
        let mut picker = picker();
        let bus = EventBus::new();
        picker.open(LocationRole::Pickup, None, &bus);
        picker.move_end(Coord::new(40.0, -76.0));
        let req = picker.confirm().unwrap();
        let (_, point) = picker
            .on_reverse(req.ticket, Err(ApiError::network("down")), &bus)
            .unwrap();
        assert_eq!(point.label, "Selected location");
        assert_eq!((point.lat, point.lon), (40.0, -76.0));
    }

    #[test]
    fn reopening_discards_pending_confirm() {
        let mut picker = picker();
        let bus = EventBus::new();
        picker.open(LocationRole::Pickup, None, &bus);
        let stale = picker.confirm().unwrap();
        picker.open(LocationRole::Dropoff, None, &bus);

        assert_eq!(
            picker.on_reverse(stale.ticket, Ok(ReverseGeocodeResult::default()), &bus),
            None
        );
        assert_eq!(picker.state(), PickerState::Open(LocationRole::Dropoff));
    }

    #[test]
    fn cancel_closes_without_committing() {
        let mut picker = picker();
        let bus = EventBus::new();
        assert!(!picker.cancel(&bus));
        picker.open(LocationRole::Current, None, &bus);
        bus.drain();
        assert!(picker.cancel(&bus));
        assert_eq!(bus.drain(), vec![Event::DrawerClosed]);
        assert_eq!(picker.confirm(), None);
    }

    #[test]
    fn device_location_only_for_current_role() {
        let mut picker = picker();
        let bus = EventBus::new();
        picker.open(LocationRole::Pickup, None, &bus);
        assert_eq!(picker.use_device_location(&bus), None);

        picker.open(LocationRole::Current, None, &bus);
        let ticket = picker.use_device_location(&bus).unwrap();
        let req = picker
            .on_geolocation(ticket, Ok(Coord::new(39.0, -77.0)), &bus)
            .unwrap();
        assert_eq!(req.center, Coord::new(39.0, -77.0));
        let (role, point) = picker
            .on_reverse(
                req.ticket,
                Ok(ReverseGeocodeResult {
                    display_name: Some("A".into()),
                }),
                &bus,
            )
            .unwrap();
        assert_eq!(role, LocationRole::Current);
        assert_eq!(point, GeoPoint::new("A", 39.0, -77.0));
    }

    #[test]
    fn device_location_waits_for_pending_confirm() {
        let mut picker = picker();
        let bus = EventBus::new();
        picker.open(LocationRole::Current, None, &bus);
        picker.move_end(Coord::new(40.0, -76.0));
        let req = picker.confirm().unwrap();

        assert_eq!(picker.use_device_location(&bus), None);
        let (_, point) = picker
            .on_reverse(
                req.ticket,
                Ok(ReverseGeocodeResult {
                    display_name: Some("A".into()),
                }),
                &bus,
            )
            .unwrap();
        assert_eq!(point, GeoPoint::new("A", 40.0, -76.0));
    }

    #[test]
    fn denied_geolocation_leaves_drawer_open() {
        let mut picker = picker();
        let bus = EventBus::new();
        picker.open(LocationRole::Current, None, &bus);
        bus.drain();
        let ticket = picker.use_device_location(&bus).unwrap();
        assert_eq!(
            picker.on_geolocation(ticket, Err(GeolocationError::PermissionDenied), &bus),
            None
        );
        assert_eq!(picker.state(), PickerState::Open(LocationRole::Current));
        assert!(!picker.is_busy());
        assert!(matches!(bus.drain().as_slice(), [Event::ShowError { .. }]));
    }

    #[test]
    fn choosing_a_result_moves_draft_only() {
        let mut picker = picker();
        let bus = EventBus::new();
        let t0 = Instant::now();
        picker.open(LocationRole::Pickup, None, &bus);
        picker.query_changed("Reno", t0);
        let req = picker.poll(t0 + WINDOW).unwrap();
        picker.on_search_response(
            req.ticket,
            Ok(vec![SearchResult {
                display_name: "Reno, NV".into(),
                lat: "39.53".into(),
                lon: "-119.81".into(),
            }]),
            &bus,
        );

        assert!(picker.choose_result(0, &bus));
        assert_eq!(picker.draft_center(), Some(Coord::new(39.53, -119.81)));
        assert!(picker.search().results().is_empty());
        assert_eq!(picker.state(), PickerState::Open(LocationRole::Pickup));
        assert!(!picker.choose_result(0, &bus));
    }
}
