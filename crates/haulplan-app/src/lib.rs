//! Trip visualization and interaction core.
//!
//! Everything here runs on one UI loop. Timers are polled with explicit
//! `Instant`s and network work goes out through a [`RequestSink`], coming
//! back as [`Completion`]s that [`AppController::pump`] routes to whichever
//! component is still waiting for them.

pub mod dispatch;
pub mod geocode;
pub mod geolocation;
pub mod logs;
pub mod markers;
pub mod picker;
pub mod planner;
pub mod reveal;
pub mod schedule;
pub mod selection;
pub mod settings;
pub mod trip_view;
pub mod viewport;

pub use dispatch::{Completion, Dispatcher, Outcome, Request, RequestSink, Ticket};
pub use geocode::{GeocodeSearchController, SearchRequest};
pub use geolocation::{FixedLocation, GeolocationError, GeolocationProvider};
pub use logs::{LogPdf, LogViewer};
pub use markers::{MarkerHandle, MarkerRegistry, SharedMarker};
pub use picker::{LocationPickerWorkflow, PickerState, ReverseRequest};
pub use planner::{MAX_CYCLE_HOURS, SubmitRequest, TripPlanner};
pub use reveal::{LegRevealScheduler, RevealProgress, RevealState};
pub use selection::SelectionBinder;
pub use settings::AppSettings;
pub use trip_view::TripVisualizationController;
pub use viewport::{ViewportControl, ViewportMode};

use chrono::{DateTime, Utc};
use crossbeam_channel::Receiver;
use haulplan_core::{Coord, GeoPoint, LegId, LocationRole, TripId, ValidationError};
use haulplan_events::{Event, EventBus, SelectionOrigin};
use std::time::Instant;
use tracing::{debug, warn};

/// Headless orchestrator for the trip planner.
///
/// Any shell (CLI, desktop, web bridge) drives it by calling the action
/// methods, calling [`AppController::pump`] once per frame, and consuming
/// [`Event`]s from [`AppController::events`].
pub struct AppController<S: RequestSink> {
    settings: AppSettings,
    sink: S,
    completions: Receiver<Completion>,
    bus: EventBus,
    planner: TripPlanner,
    picker: LocationPickerWorkflow,
    view: TripVisualizationController,
    logs: LogViewer,
    last_pdf: Option<LogPdf>,
}

impl<S: RequestSink> AppController<S> {
    pub fn new(settings: AppSettings, sink: S, completions: Receiver<Completion>) -> Self {
        let search =
            GeocodeSearchController::new(settings.search_debounce(), settings.min_query_len);
        let picker = LocationPickerWorkflow::new(search, settings.default_center);
        let view =
            TripVisualizationController::new(settings.reveal_interval(), settings.fit_padding_px);
        Self {
            settings,
            sink,
            completions,
            bus: EventBus::new(),
            planner: TripPlanner::new(),
            picker,
            view,
            logs: LogViewer::new(),
            last_pdf: None,
        }
    }

    pub fn settings(&self) -> &AppSettings {
        &self.settings
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// Subscribe to view commands and notifications.
    pub fn events(&self) -> Receiver<Event> {
        self.bus.receiver()
    }

    pub fn planner(&self) -> &TripPlanner {
        &self.planner
    }

    pub fn picker(&self) -> &LocationPickerWorkflow {
        &self.picker
    }

    pub fn view(&self) -> &TripVisualizationController {
        &self.view
    }

    pub fn logs(&self) -> &LogViewer {
        &self.logs
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// True while anything is debouncing, in flight or still revealing.
    pub fn is_busy(&self) -> bool {
        self.planner.is_submitting()
            || self.picker.is_busy()
            || self.picker.search().is_pending()
            || self.picker.search().is_loading()
            || self.logs.is_loading_sheets()
            || self.logs.is_downloading()
            || self.view.reveal_state() == RevealState::Revealing
    }

    /// Runs one frame: applies finished requests, fires due debounced
    /// searches and advances the reveal. Returns how many completions were
    /// applied.
    pub fn pump(&mut self, now: Instant) -> usize {
        let mut handled = 0;
        while let Ok(completion) = self.completions.try_recv() {
            self.apply(completion, now);
            handled += 1;
        }
        if let Some(search) = self.picker.poll(now) {
            self.sink
                .submit(search.ticket, Request::Search(search.query));
        }
        self.view.poll(now, &self.bus);
        handled
    }

    /// Routes one completion. Exposed for shells that receive completions
    /// on their own channel.
    pub fn apply(&mut self, completion: Completion, now: Instant) {
        let Completion { ticket, outcome } = completion;
        match outcome {
            Outcome::Trip(result) => {
                if let Some(trip) = self.planner.on_submit_response(ticket, result, &self.bus) {
                    self.picker.cancel(&self.bus);
                    self.view.load_trip(trip, now, &self.bus);
                }
            }
            Outcome::Search(result) => {
                self.picker.on_search_response(ticket, result, &self.bus);
            }
            Outcome::Reverse(result) => {
                if let Some((role, point)) = self.picker.on_reverse(ticket, result, &self.bus) {
                    if self.store_location(role, Some(point.clone())) {
                        self.bus.publish(Event::LocationCommitted { role, point });
                    }
                }
            }
            Outcome::Geolocation(result) => {
                if let Some(reverse) = self.picker.on_geolocation(ticket, result, &self.bus) {
                    self.sink
                        .submit(reverse.ticket, Request::Reverse(reverse.center));
                }
            }
            Outcome::LogSheets(trip, result) => {
                self.logs.on_sheets(ticket, trip, result, &self.bus);
            }
            Outcome::LogPdf(trip, result) => {
                if let Some(pdf) = self.logs.on_pdf(ticket, trip, result, &self.bus) {
                    self.last_pdf = Some(pdf);
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // Location picker
    // ------------------------------------------------------------------

    pub fn open_picker(&mut self, role: LocationRole) -> bool {
        if self.planner.planned().is_some() {
            self.bus.warn(ValidationError::TripLocked.user_message());
            return false;
        }
        let existing = self.planner.locations().get(role).cloned();
        self.picker.open(role, existing.as_ref(), &self.bus);
        true
    }

    pub fn cancel_picker(&mut self) -> bool {
        self.picker.cancel(&self.bus)
    }

    pub fn picker_moved(&mut self, center: Coord) {
        self.picker.move_end(center);
    }

    pub fn search_query_changed(&mut self, text: impl Into<String>, now: Instant) {
        self.picker.query_changed(text, now);
    }

    pub fn choose_search_result(&mut self, index: usize) -> bool {
        self.picker.choose_result(index, &self.bus)
    }

    pub fn confirm_location(&mut self) -> bool {
        match self.picker.confirm() {
            Some(reverse) => {
                self.sink
                    .submit(reverse.ticket, Request::Reverse(reverse.center));
                true
            }
            None => false,
        }
    }

    pub fn use_device_location(&mut self) -> bool {
        match self.picker.use_device_location(&self.bus) {
            Some(ticket) => {
                self.sink.submit(ticket, Request::Geolocate);
                true
            }
            None => false,
        }
    }

    /// Sets a location directly, bypassing the picker.
    pub fn set_location(&mut self, role: LocationRole, point: GeoPoint) -> bool {
        self.store_location(role, Some(point))
    }

    pub fn clear_location(&mut self, role: LocationRole) -> bool {
        let cleared = self.store_location(role, None);
        if cleared {
            self.bus.publish(Event::LocationCleared { role });
        }
        cleared
    }

    fn store_location(&mut self, role: LocationRole, point: Option<GeoPoint>) -> bool {
        match self.planner.set_location(role, point) {
            Ok(()) => {
                self.view
                    .set_locations(self.planner.locations().clone(), &self.bus);
                true
            }
            Err(error) => {
                warn!(role = role.as_str(), %error, "location edit rejected");
                self.bus.warn(error.user_message());
                false
            }
        }
    }

    // ------------------------------------------------------------------
    // Trip planning
    // ------------------------------------------------------------------

    pub fn set_cycle_hours(&mut self, hours: f64) -> Result<(), ValidationError> {
        self.planner.set_cycle_hours(hours).inspect_err(|error| {
            self.bus.warn(error.user_message());
        })
    }

    /// Submits the trip. `Ok(false)` means a submission was already running.
    /// An open picker draft is discarded, so a late reverse geocode cannot
    /// edit a location that has already been sent.
    pub fn submit_trip(&mut self, departure_time: DateTime<Utc>) -> Result<bool, ValidationError> {
        match self.planner.submit(departure_time, &self.bus)? {
            Some(request) => {
                self.picker.cancel(&self.bus);
                self.sink
                    .submit(request.ticket, Request::CreateTrip(request.body));
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// "Plan new trip": tears the view down and unlocks the inputs.
    pub fn reset_trip(&mut self) {
        debug!("resetting planned trip");
        self.view.teardown(&self.bus);
        self.planner.reset(&self.bus);
        self.logs.clear();
        self.last_pdf = None;
    }

    // ------------------------------------------------------------------
    // Trip view
    // ------------------------------------------------------------------

    pub fn select_leg(&mut self, leg: LegId, origin: SelectionOrigin) -> bool {
        self.view.select_leg(leg, origin, &self.bus)
    }

    pub fn clear_selection(&mut self) {
        self.view.clear_selection(&self.bus);
    }

    pub fn register_marker(&mut self, leg: LegId, handle: SharedMarker) {
        self.view.register_marker(leg, handle);
    }

    pub fn unregister_marker(&mut self, leg: LegId) {
        self.view.unregister_marker(leg);
    }

    // ------------------------------------------------------------------
    // Log sheets
    // ------------------------------------------------------------------

    pub fn request_logs(&mut self, trip: TripId) -> bool {
        match self.logs.request_sheets(trip) {
            Some(ticket) => {
                self.sink.submit(ticket, Request::LogSheets(trip));
                true
            }
            None => false,
        }
    }

    pub fn download_logs(&mut self, trip: TripId) -> bool {
        match self.logs.request_pdf(trip) {
            Some(ticket) => {
                self.sink.submit(ticket, Request::DownloadLogs(trip));
                true
            }
            None => false,
        }
    }

    /// Takes the most recently downloaded PDF, if any.
    pub fn take_pdf(&mut self) -> Option<LogPdf> {
        self.last_pdf.take()
    }
}
