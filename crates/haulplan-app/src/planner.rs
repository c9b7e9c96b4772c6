use crate::dispatch::Ticket;
use chrono::{DateTime, Utc};
use haulplan_api::{ApiError, CreateTripRequest};
use haulplan_core::{GeoPoint, LocationRole, LocationSet, Trip, TripId, ValidationError};
use haulplan_events::{Event, EventBus, telemetry};
use tracing::{debug, info, warn};

/// Hours available in the 70-hour/8-day cycle.
pub const MAX_CYCLE_HOURS: f64 = 70.0;

#[derive(Debug, Clone, PartialEq)]
pub struct SubmitRequest {
    pub ticket: Ticket,
    pub body: CreateTripRequest,
}

/// Trip form state: the three locations, cycle hours used, and whether a
/// submission is in flight or a trip has been planned.
#[derive(Debug, Default)]
pub struct TripPlanner {
    locations: LocationSet,
    cycle_hours: f64,
    submitting: Option<Ticket>,
    planned: Option<TripId>,
}

impl TripPlanner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn locations(&self) -> &LocationSet {
        &self.locations
    }

    pub fn cycle_hours(&self) -> f64 {
        self.cycle_hours
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting.is_some()
    }

    pub fn planned(&self) -> Option<TripId> {
        self.planned
    }

    pub fn set_location(
        &mut self,
        role: LocationRole,
        point: Option<GeoPoint>,
    ) -> Result<(), ValidationError> {
        if self.planned.is_some() {
            return Err(ValidationError::TripLocked);
        }
        if point.as_ref().is_some_and(|p| !p.coord().is_finite()) {
            return Err(ValidationError::NonFiniteCoordinate);
        }
        self.locations.set(role, point);
        Ok(())
    }

    pub fn set_cycle_hours(&mut self, hours: f64) -> Result<(), ValidationError> {
        if self.planned.is_some() {
            return Err(ValidationError::TripLocked);
        }
        if !(0.0..=MAX_CYCLE_HOURS).contains(&hours) {
            return Err(ValidationError::CycleHoursOutOfRange {
                value: hours,
                max: MAX_CYCLE_HOURS,
            });
        }
        self.cycle_hours = hours;
        Ok(())
    }

    /// Validates and builds the create-trip request. Validation failures are
    /// published as a warning and never reach the network. Returns `Ok(None)`
    /// while a previous submission is still in flight.
    pub fn submit(
        &mut self,
        departure_time: DateTime<Utc>,
        bus: &EventBus,
    ) -> Result<Option<SubmitRequest>, ValidationError> {
        if self.submitting.is_some() {
            debug!("submit ignored, already submitting");
            return Ok(None);
        }
        if self.planned.is_some() {
            bus.warn(ValidationError::TripLocked.user_message());
            return Err(ValidationError::TripLocked);
        }
        let complete = match self.locations.require_all() {
            Ok(complete) => complete,
            Err(error) => {
                warn!(%error, "trip submission rejected");
                bus.warn(error.user_message());
                return Err(error);
            }
        };

        let body = CreateTripRequest::new(
            complete.current,
            complete.pickup,
            complete.dropoff,
            self.cycle_hours,
            departure_time,
        );
        let ticket = Ticket::next();
        self.submitting = Some(ticket);
        info!(%ticket, name = %body.name, "submitting trip");
        bus.publish(Event::TripSubmitted);
        Ok(Some(SubmitRequest { ticket, body }))
    }

    /// Applies the create-trip response, returning the trip to display.
    pub fn on_submit_response(
        &mut self,
        ticket: Ticket,
        result: Result<Trip, ApiError>,
        bus: &EventBus,
    ) -> Option<Trip> {
        if self.submitting != Some(ticket) {
            telemetry::stale_completion(telemetry::REQ_CREATE_TRIP, ticket.get());
            return None;
        }
        self.submitting = None;
        match result {
            Ok(trip) => {
                info!(trip = %trip.id, legs = trip.len(), "trip planned");
                self.planned = Some(trip.id);
                bus.success("Trip planned successfully.");
                Some(trip)
            }
            Err(error) => {
                warn!(code = %error.code, message = %error.message, "trip planning failed");
                bus.publish(Event::TripPlanFailed {
                    error: error.message.clone(),
                });
                bus.error(format!("Could not plan trip: {}", error.message));
                None
            }
        }
    }

    /// Forgets the planned trip so inputs become editable again. Locations
    /// and cycle hours are kept.
    pub fn reset(&mut self, bus: &EventBus) {
        self.planned = None;
        self.submitting = None;
        bus.publish(Event::TripReset);
    }
}
