use crate::dispatch::Ticket;
use haulplan_api::{ApiError, SvgLogsResponse, paths};
use haulplan_core::TripId;
use haulplan_events::{Event, EventBus, telemetry};
use tracing::warn;

/// A PDF the user asked for, ready to be written somewhere.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogPdf {
    pub trip: TripId,
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Daily log sheets for a planned trip: SVG previews and the PDF download.
#[derive(Debug, Default)]
pub struct LogViewer {
    sheets_pending: Option<(Ticket, TripId)>,
    pdf_pending: Option<(Ticket, TripId)>,
    trip: Option<TripId>,
    svg_urls: Vec<String>,
}

impl LogViewer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn svg_urls(&self) -> &[String] {
        &self.svg_urls
    }

    pub fn trip(&self) -> Option<TripId> {
        self.trip
    }

    pub fn is_loading_sheets(&self) -> bool {
        self.sheets_pending.is_some()
    }

    pub fn is_downloading(&self) -> bool {
        self.pdf_pending.is_some()
    }

    /// Returns the ticket for a new sheet request, or `None` when one for
    /// the same trip is already running.
    pub fn request_sheets(&mut self, trip: TripId) -> Option<Ticket> {
        if matches!(self.sheets_pending, Some((_, pending)) if pending == trip) {
            return None;
        }
        let ticket = Ticket::next();
        self.sheets_pending = Some((ticket, trip));
        if self.trip != Some(trip) {
            self.svg_urls.clear();
        }
        Some(ticket)
    }

    pub fn on_sheets(
        &mut self,
        ticket: Ticket,
        trip: TripId,
        result: Result<SvgLogsResponse, ApiError>,
        bus: &EventBus,
    ) -> bool {
        if self.sheets_pending != Some((ticket, trip)) {
            telemetry::stale_completion(telemetry::REQ_GENERATE_LOGS, ticket.get());
            return false;
        }
        self.sheets_pending = None;
        match result {
            Ok(response) => {
                self.trip = Some(trip);
                self.svg_urls = response.svg_urls;
                bus.publish(Event::LogSheetsReady {
                    trip,
                    svg_urls: self.svg_urls.clone(),
                });
            }
            Err(error) => {
                warn!(%trip, code = %error.code, "log sheet generation failed");
                bus.error(format!("Could not load log sheets: {}", error.message));
            }
        }
        true
    }

    pub fn request_pdf(&mut self, trip: TripId) -> Option<Ticket> {
        if matches!(self.pdf_pending, Some((_, pending)) if pending == trip) {
            return None;
        }
        let ticket = Ticket::next();
        self.pdf_pending = Some((ticket, trip));
        Some(ticket)
    }

    pub fn on_pdf(
        &mut self,
        ticket: Ticket,
        trip: TripId,
        result: Result<Vec<u8>, ApiError>,
        bus: &EventBus,
    ) -> Option<LogPdf> {
        if self.pdf_pending != Some((ticket, trip)) {
            telemetry::stale_completion(telemetry::REQ_DOWNLOAD_LOGS, ticket.get());
            return None;
        }
        self.pdf_pending = None;
        match result {
            Ok(bytes) => {
                let pdf = LogPdf {
                    trip,
                    file_name: paths::log_pdf_file_name(trip),
                    bytes,
                };
                bus.publish(Event::LogPdfDownloaded {
                    trip,
                    file_name: pdf.file_name.clone(),
                    bytes: pdf.bytes.clone(),
                });
                Some(pdf)
            }
            Err(error) => {
                warn!(%trip, code = %error.code, "log download failed");
                bus.error(format!("Could not download logs: {}", error.message));
                None
            }
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
