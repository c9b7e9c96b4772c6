use crate::dispatch::Ticket;
use crate::schedule::Debouncer;
use haulplan_api::{ApiError, FALLBACK_LOCATION_LABEL, ReverseGeocodeResult, SearchResult};
use haulplan_events::{Event, EventBus, telemetry};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// A search the controller wants sent. The response must come back through
/// [`GeocodeSearchController::on_response`] with the same ticket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub ticket: Ticket,
    pub query: String,
}

/// Debounced free-text place search.
///
/// Short queries clear immediately without touching the network. Longer
/// ones wait for the debounce window to go quiet, then fire once. Only the
/// most recent request is authoritative: a response for any other ticket is
/// dropped, and a new keystroke invalidates whatever is in flight.
#[derive(Debug)]
pub struct GeocodeSearchController {
    query: String,
    results: Vec<SearchResult>,
    loading: bool,
    last_error: Option<ApiError>,
    debouncer: Debouncer<String>,
    in_flight: Option<Ticket>,
    min_query_len: usize,
}

impl GeocodeSearchController {
    pub fn new(debounce: Duration, min_query_len: usize) -> Self {
        Self {
            query: String::new(),
            results: Vec::new(),
            loading: false,
            last_error: None,
            debouncer: Debouncer::new(debounce),
            in_flight: None,
            min_query_len,
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn results(&self) -> &[SearchResult] {
        &self.results
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn last_error(&self) -> Option<&ApiError> {
        self.last_error.as_ref()
    }

    pub fn is_pending(&self) -> bool {
        self.debouncer.is_pending()
    }

    pub fn in_flight(&self) -> Option<Ticket> {
        self.in_flight
    }

    pub fn on_query_changed(&mut self, text: impl Into<String>, now: Instant) {
        self.query = text.into();
        self.in_flight = None;
        self.loading = false;

        if self.query.trim().chars().count() < self.min_query_len {
            self.debouncer.cancel();
            self.results.clear();
            self.last_error = None;
            return;
        }

        if self.debouncer.call(self.query.clone(), now) {
            debug!(query = %self.query, "search superseded pending query");
        }
    }

    /// Fires the debounced search once its window has elapsed.
    pub fn poll(&mut self, now: Instant) -> Option<SearchRequest> {
        let query = self.debouncer.poll(now)?;
        let ticket = Ticket::next();
        self.in_flight = Some(ticket);
        self.loading = true;
        self.last_error = None;
        debug!(%ticket, %query, "search fired");
        Some(SearchRequest { ticket, query })
    }

    /// Applies a search response. Returns false when the ticket was stale and
    /// the response was discarded.
    pub fn on_response(
        &mut self,
        ticket: Ticket,
        result: Result<Vec<SearchResult>, ApiError>,
        bus: &EventBus,
    ) -> bool {
        if self.in_flight != Some(ticket) {
            telemetry::stale_completion(telemetry::REQ_GEOCODE_SEARCH, ticket.get());
            return false;
        }
        self.in_flight = None;
        self.loading = false;

        match result {
            Ok(results) => {
                self.results = results;
                bus.publish(Event::SearchResultsChanged {
                    query: self.query.clone(),
                    count: self.results.len(),
                });
            }
            Err(error) => {
                warn!(code = %error.code, message = %error.message, "search failed");
                self.results.clear();
                bus.publish(Event::SearchFailed {
                    error: error.message.clone(),
                });
                bus.error(format!("Search failed: {}", error.message));
                self.last_error = Some(error);
            }
        }
        true
    }

    /// Drops the query, results and anything pending or in flight.
    pub fn clear(&mut self) {
        self.query.clear();
        self.results.clear();
        self.loading = false;
        self.last_error = None;
        self.debouncer.cancel();
        self.in_flight = None;
    }

    /// Deadline of the pending debounced search, for loops that sleep.
    pub fn deadline(&self) -> Option<Instant> {
        self.debouncer.deadline()
    }
}

/// Label for a reverse geocode outcome. Failures fall back to a generic label.
pub fn reverse_label(result: &Result<ReverseGeocodeResult, ApiError>) -> String {
    match result {
        Ok(found) => found.label().to_string(),
        Err(error) => {
            warn!(code = %error.code, "reverse geocode failed, using fallback label");
            FALLBACK_LOCATION_LABEL.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_millis(1200);

    fn controller() -> GeocodeSearchController {
        GeocodeSearchController::new(WINDOW, 3)
    }

    fn result(name: &str) -> SearchResult {
        SearchResult {
            display_name: name.into(),
            lat: "37.77".into(),
            lon: "-122.42".into(),
        }
    }

    #[test]
    fn short_query_never_fires() {
        let mut search = controller();
        let t0 = Instant::now();
        search.on_query_changed("Sa", t0);
        assert!(!search.is_pending());
        assert_eq!(search.poll(t0 + WINDOW * 3), None);
        assert!(!search.is_loading());
    }

    #[test]
    fn burst_fires_once_for_last_query() {
        let mut search = controller();
        let t0 = Instant::now();
        search.on_query_changed("S", t0);
        search.on_query_changed("Sa", t0 + Duration::from_millis(100));
        search.on_query_changed("San", t0 + Duration::from_millis(200));
        search.on_query_changed("San ", t0 + Duration::from_millis(300));
        search.on_query_changed("San", t0 + Duration::from_millis(400));

        assert_eq!(search.poll(t0 + Duration::from_millis(1500)), None);
        let fired = search
            .poll(t0 + Duration::from_millis(1600))
            .expect("search should fire");
        assert_eq!(fired.query, "San");
        assert!(search.is_loading());
        assert_eq!(search.poll(t0 + Duration::from_secs(10)), None);
    }

    #[test]
    fn response_replaces_results_and_releases_loading() {
        let mut search = controller();
        let bus = EventBus::new();
        let t0 = Instant::now();
        search.on_query_changed("Denver", t0);
        let req = search.poll(t0 + WINDOW).unwrap();

        assert!(search.on_response(req.ticket, Ok(vec![result("Denver, CO")]), &bus));
        assert!(!search.is_loading());
        assert_eq!(search.results().len(), 1);
        assert_eq!(
            bus.drain(),
            vec![Event::SearchResultsChanged {
                query: "Denver".into(),
                count: 1
            }]
        );
    }

    #[test]
    fn superseded_response_is_discarded() {
        let mut search = controller();
        let bus = EventBus::new();
        let t0 = Instant::now();
        search.on_query_changed("Denver", t0);
        let old = search.poll(t0 + WINDOW).unwrap();

        let t1 = t0 + WINDOW + Duration::from_millis(10);
        search.on_query_changed("Dallas", t1);
        assert!(!search.on_response(old.ticket, Ok(vec![result("Denver, CO")]), &bus));
        assert!(search.results().is_empty());

        let new = search.poll(t1 + WINDOW).unwrap();
        assert!(search.on_response(new.ticket, Ok(vec![result("Dallas, TX")]), &bus));
        assert_eq!(search.results()[0].display_name, "Dallas, TX");
    }

    #[test]
    fn response_after_clearing_does_not_repopulate() {
        let mut search = controller();
        let bus = EventBus::new();
        let t0 = Instant::now();
        search.on_query_changed("Denver", t0);
        let req = search.poll(t0 + WINDOW).unwrap();
        search.on_query_changed("", t0 + WINDOW);

        assert!(!search.on_response(req.ticket, Ok(vec![result("Denver, CO")]), &bus));
        assert!(search.results().is_empty());
        assert!(!search.is_loading());
        assert!(bus.drain().is_empty());
    }

    #[test]
    fn failure_clears_results_and_notifies() {
        let mut search = controller();
        let bus = EventBus::new();
        let t0 = Instant::now();
        search.on_query_changed("Denver", t0);
        let first = search.poll(t0 + WINDOW).unwrap();
        search.on_response(first.ticket, Ok(vec![result("Denver, CO")]), &bus);

        search.on_query_changed("Denverr", t0 + WINDOW * 2);
        let second = search.poll(t0 + WINDOW * 3).unwrap();
        search.on_response(second.ticket, Err(ApiError::network("offline")), &bus);

        assert!(search.results().is_empty());
        assert!(!search.is_loading());
        assert_eq!(search.last_error().map(|e| e.code.as_str()), Some("network"));
        assert!(bus
            .drain()
            .iter()
            .any(|e| matches!(e, Event::ShowError { .. })));
    }

    #[test]
    fn reverse_failure_uses_fallback_label() {
        assert_eq!(
            reverse_label(&Err(ApiError::timeout("slow"))),
            FALLBACK_LOCATION_LABEL
        );
        let found = ReverseGeocodeResult {
            display_name: Some("Reno, NV".into()),
        };
        assert_eq!(reverse_label(&Ok(found)), "Reno, NV");
    }
}
