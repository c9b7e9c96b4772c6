//! Request plumbing between the interaction core and the backend.
//!
//! Controllers never await. They hand a [`Request`] plus a [`Ticket`] to a
//! [`RequestSink`] and later receive a [`Completion`] carrying the same
//! ticket. A controller only applies a completion whose ticket it is still
//! waiting for, so late responses to superseded requests are dropped.

use crate::geolocation::{GeolocationError, GeolocationProvider};
use crossbeam_channel::{Receiver, Sender, unbounded};
use haulplan_api::{
    ApiError, CreateTripRequest, ReverseGeocodeResult, SearchResult, SvgLogsResponse,
    normalize_trip,
};
use haulplan_client::TripBackend;
use haulplan_core::{Coord, Trip, TripId};
use haulplan_events::telemetry::{self, RequestTrace};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::runtime::Handle;

static NEXT_TICKET: AtomicU64 = AtomicU64::new(1);

/// Identifies one outstanding request. Unique for the life of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Ticket(u64);

impl Ticket {
    pub fn next() -> Self {
        Ticket(NEXT_TICKET.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Ticket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    CreateTrip(CreateTripRequest),
    Search(String),
    Reverse(Coord),
    Geolocate,
    /// Generate the SVG sheets, then fetch their URLs.
    LogSheets(TripId),
    DownloadLogs(TripId),
}

impl Request {
    pub fn name(&self) -> &'static str {
        match self {
            Request::CreateTrip(_) => telemetry::REQ_CREATE_TRIP,
            Request::Search(_) => telemetry::REQ_GEOCODE_SEARCH,
            Request::Reverse(_) => telemetry::REQ_GEOCODE_REVERSE,
            Request::Geolocate => telemetry::REQ_GEOLOCATE,
            Request::LogSheets(_) => telemetry::REQ_GENERATE_LOGS,
            Request::DownloadLogs(_) => telemetry::REQ_DOWNLOAD_LOGS,
        }
    }

    /// What the request is about, for the request log.
    pub fn subject(&self) -> Option<String> {
        match self {
            Request::CreateTrip(body) => Some(body.name.clone()),
            Request::Search(query) => Some(query.clone()),
            Request::Reverse(coord) => Some(coord.to_string()),
            Request::Geolocate => None,
            Request::LogSheets(trip) | Request::DownloadLogs(trip) => Some(trip.to_string()),
        }
    }
}

#[derive(Debug, Clone)]
pub enum Outcome {
    Trip(Result<Trip, ApiError>),
    Search(Result<Vec<SearchResult>, ApiError>),
    Reverse(Result<ReverseGeocodeResult, ApiError>),
    Geolocation(Result<Coord, GeolocationError>),
    LogSheets(TripId, Result<SvgLogsResponse, ApiError>),
    LogPdf(TripId, Result<Vec<u8>, ApiError>),
}

impl Outcome {
    fn failure_reason(&self) -> Option<String> {
        match self {
            Outcome::Trip(Err(e))
            | Outcome::Search(Err(e))
            | Outcome::Reverse(Err(e))
            | Outcome::LogSheets(_, Err(e))
            | Outcome::LogPdf(_, Err(e)) => Some(e.code.clone()),
            Outcome::Geolocation(Err(e)) => Some(ApiError::from(e).code),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Completion {
    pub ticket: Ticket,
    pub outcome: Outcome,
}

/// Where controllers send work. The completion comes back on whatever
/// channel the sink was built with.
pub trait RequestSink {
    fn submit(&self, ticket: Ticket, request: Request);
}

/// Runs requests on a tokio runtime and reports completions over a channel
/// that the UI loop drains.
pub struct Dispatcher {
    runtime: Handle,
    backend: Arc<dyn TripBackend>,
    geolocation: Option<Arc<dyn GeolocationProvider>>,
    tx: Sender<Completion>,
    rx: Receiver<Completion>,
}

impl Dispatcher {
    pub fn new(runtime: Handle, backend: Arc<dyn TripBackend>) -> Self {
        let (tx, rx) = unbounded();
        Self {
            runtime,
            backend,
            geolocation: None,
            tx,
            rx,
        }
    }

    pub fn with_geolocation(mut self, provider: Arc<dyn GeolocationProvider>) -> Self {
        self.geolocation = Some(provider);
        self
    }

    pub fn completions(&self) -> Receiver<Completion> {
        self.rx.clone()
    }
}

impl RequestSink for Dispatcher {
    fn submit(&self, ticket: Ticket, request: Request) {
        let backend = Arc::clone(&self.backend);
        let geolocation = self.geolocation.clone();
        let tx = self.tx.clone();
        self.runtime.spawn(async move {
            let trace = RequestTrace::begin(request.name(), ticket.get(), request.subject());
            let outcome = execute(backend.as_ref(), geolocation.as_deref(), request).await;
            trace.finish(outcome.failure_reason());
            if tx.send(Completion { ticket, outcome }).is_err() {
                trace.undelivered();
            }
        });
    }
}

async fn execute(
    backend: &dyn TripBackend,
    geolocation: Option<&dyn GeolocationProvider>,
    request: Request,
) -> Outcome {
    match request {
        Request::CreateTrip(body) => Outcome::Trip(
            backend
                .create_trip(&body)
                .await
                .map(normalize_trip)
                .map_err(ApiError::from),
        ),
        Request::Search(query) => {
            Outcome::Search(backend.search(&query).await.map_err(ApiError::from))
        }
        Request::Reverse(coord) => {
            Outcome::Reverse(backend.reverse(coord).await.map_err(ApiError::from))
        }
        Request::Geolocate => Outcome::Geolocation(match geolocation {
            Some(provider) => provider.locate().await,
            None => Err(GeolocationError::Unavailable),
        }),
        Request::LogSheets(trip) => {
            let result = match backend.generate_svgs(trip).await {
                Ok(()) => backend.svg_logs(trip).await,
                Err(e) => Err(e),
            };
            Outcome::LogSheets(trip, result.map_err(ApiError::from))
        }
        Request::DownloadLogs(trip) => Outcome::LogPdf(
            trip,
            backend.download_logs(trip).await.map_err(ApiError::from),
        ),
    }
}
