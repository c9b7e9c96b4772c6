//! Endpoint paths, relative to the API base URL.

use haulplan_core::TripId;

pub const TRIPS: &str = "/trips/trips/";
pub const GEOCODE_SEARCH: &str = "/trips/geocode/search/";
pub const GEOCODE_REVERSE: &str = "/trips/geocode/reverse/";

pub fn generate_svgs(trip: TripId) -> String {
    format!("/trips/trips/{trip}/generate_svgs/")
}

pub fn svg_logs(trip: TripId) -> String {
    format!("/trips/trips/{trip}/svg_logs/")
}

pub fn download_logs(trip: TripId) -> String {
    format!("/trips/trips/{trip}/download_logs/")
}

/// File name offered for the downloaded log PDF.
pub fn log_pdf_file_name(trip: TripId) -> String {
    format!("DailyLogs-{trip}.pdf")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trip_scoped_paths() {
        assert_eq!(generate_svgs(TripId(7)), "/trips/trips/7/generate_svgs/");
        assert_eq!(svg_logs(TripId(7)), "/trips/trips/7/svg_logs/");
        assert_eq!(download_logs(TripId(7)), "/trips/trips/7/download_logs/");
        assert_eq!(log_pdf_file_name(TripId(7)), "DailyLogs-7.pdf");
    }
}
