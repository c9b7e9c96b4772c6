//! Request traces for the trip planner backend.
//!
//! The dispatcher opens a [`RequestTrace`] per ticket and finishes it when
//! the backend answers. Controllers report completions they drop as stale
//! through [`stale_completion`], so a superseded search or reverse geocode
//! shows up in the log next to the ticket that replaced it. Everything is
//! logged under [`TELEMETRY_TARGET`].

use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

pub const TELEMETRY_TARGET: &str = "haulplan::events::telemetry";

pub const REQ_CREATE_TRIP: &str = "CreateTrip";
pub const REQ_GEOCODE_SEARCH: &str = "GeocodeSearch";
pub const REQ_GEOCODE_REVERSE: &str = "GeocodeReverse";
pub const REQ_GENERATE_LOGS: &str = "GenerateLogs";
pub const REQ_DOWNLOAD_LOGS: &str = "DownloadLogs";
pub const REQ_GEOLOCATE: &str = "Geolocate";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Sent,
    Answered,
    Failed,
    /// The backend answered but the UI loop was gone.
    Undelivered,
    /// A controller dropped the answer because a newer ticket replaced it.
    Stale,
}

impl Phase {
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Sent => "sent",
            Phase::Answered => "answered",
            Phase::Failed => "failed",
            Phase::Undelivered => "undelivered",
            Phase::Stale => "stale",
        }
    }
}

/// One logged step in the life of a ticketed request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RequestRecord {
    pub ticket: u64,
    pub request: String,
    /// Query text, trip id or coordinates the request was about.
    pub subject: Option<String>,
    pub phase: Phase,
    /// Absent on records emitted by controllers, which never see it.
    pub correlation_id: Option<String>,
    pub error: Option<String>,
    pub elapsed_ms: Option<u64>,
}

fn emit(record: &RequestRecord) {
    let subject = record.subject.as_deref().unwrap_or("-");
    let correlation_id = record.correlation_id.as_deref().unwrap_or("-");
    match record.phase {
        Phase::Sent | Phase::Answered => info!(
            target: TELEMETRY_TARGET,
            ticket = record.ticket,
            request = %record.request,
            subject = %subject,
            correlation_id = %correlation_id,
            elapsed_ms = ?record.elapsed_ms,
            "request_{}",
            record.phase.as_str()
        ),
        Phase::Failed | Phase::Undelivered => warn!(
            target: TELEMETRY_TARGET,
            ticket = record.ticket,
            request = %record.request,
            subject = %subject,
            correlation_id = %correlation_id,
            error = record.error.as_deref().unwrap_or("unclassified"),
            elapsed_ms = ?record.elapsed_ms,
            "request_{}",
            record.phase.as_str()
        ),
        Phase::Stale => debug!(
            target: TELEMETRY_TARGET,
            ticket = record.ticket,
            request = %record.request,
            "request_stale"
        ),
    }
}

/// A request the dispatcher is running.
#[derive(Debug)]
pub struct RequestTrace {
    ticket: u64,
    request: &'static str,
    subject: Option<String>,
    correlation_id: String,
    started: Instant,
}

impl RequestTrace {
    /// Logs the `sent` record and starts the clock.
    pub fn begin(request: &'static str, ticket: u64, subject: Option<String>) -> Self {
        let trace = Self {
            ticket,
            request,
            subject,
            correlation_id: Uuid::new_v4().to_string(),
            started: Instant::now(),
        };
        emit(&trace.record(Phase::Sent, None));
        trace
    }

    pub fn correlation_id(&self) -> &str {
        &self.correlation_id
    }

    /// Logs `answered`, or `failed` when `error` carries a reason.
    pub fn finish(&self, error: Option<String>) -> RequestRecord {
        let phase = if error.is_some() {
            Phase::Failed
        } else {
            Phase::Answered
        };
        let record = self.record(phase, error);
        emit(&record);
        record
    }

    pub fn undelivered(&self) -> RequestRecord {
        let record = self.record(Phase::Undelivered, Some("completion channel closed".into()));
        emit(&record);
        record
    }

    fn record(&self, phase: Phase, error: Option<String>) -> RequestRecord {
        let elapsed_ms = (phase != Phase::Sent)
            .then(|| u64::try_from(self.started.elapsed().as_millis()).unwrap_or(u64::MAX));
        RequestRecord {
            ticket: self.ticket,
            request: self.request.to_string(),
            subject: self.subject.clone(),
            phase,
            correlation_id: Some(self.correlation_id.clone()),
            error,
            elapsed_ms,
        }
    }
}

/// Logs a completion that a controller dropped because its ticket is no
/// longer the one it is waiting on.
pub fn stale_completion(request: &'static str, ticket: u64) -> RequestRecord {
    let record = RequestRecord {
        ticket,
        request: request.to_string(),
        subject: None,
        phase: Phase::Stale,
        correlation_id: None,
        error: None,
        elapsed_ms: None,
    };
    emit(&record);
    record
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trace_keeps_ticket_and_subject_through_finish() {
        let trace = RequestTrace::begin(REQ_GEOCODE_SEARCH, 7, Some("Sacramento".into()));
        assert_eq!(trace.correlation_id().len(), 36);

        let answered = trace.finish(None);
        assert_eq!(answered.phase, Phase::Answered);
        assert_eq!(answered.ticket, 7);
        assert_eq!(answered.subject.as_deref(), Some("Sacramento"));
        assert_eq!(answered.correlation_id.as_deref(), Some(trace.correlation_id()));
        assert!(answered.elapsed_ms.is_some());
    }

    #[test]
    fn failure_reason_marks_the_record_failed() {
        let trace = RequestTrace::begin(REQ_CREATE_TRIP, 3, None);
        let failed = trace.finish(Some("timeout".into()));
        assert_eq!(failed.phase, Phase::Failed);
        assert_eq!(failed.error.as_deref(), Some("timeout"));

        assert_eq!(trace.undelivered().phase, Phase::Undelivered);
    }

    #[test]
    fn separate_traces_get_separate_correlation_ids() {
        let a = RequestTrace::begin(REQ_GEOLOCATE, 1, None);
        let b = RequestTrace::begin(REQ_GEOLOCATE, 2, None);
        assert_ne!(a.correlation_id(), b.correlation_id());
    }

    #[test]
    fn stale_records_carry_only_the_ticket() {
        let record = stale_completion(REQ_GEOCODE_REVERSE, 12);
        assert_eq!(record.phase, Phase::Stale);
        assert_eq!(record.ticket, 12);
        assert!(record.correlation_id.is_none());
        assert!(record.elapsed_ms.is_none());

        let json = serde_json::to_value(&record).expect("serialize record");
        assert_eq!(json["phase"], "stale");
    }
}
