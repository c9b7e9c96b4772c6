use chrono::{DateTime, Utc};
use haulplan_core::{Coord, GeoPoint, LegType};
use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, PickFirst, serde_as};

/// Label used when reverse geocoding fails or returns nothing useful.
pub const FALLBACK_LOCATION_LABEL: &str = "Selected location";

/// Body of `POST /trips/trips/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateTripRequest {
    pub name: String,
    pub current_location_label: String,
    pub current_location_lat: f64,
    pub current_location_lon: f64,
    pub pickup_location_label: String,
    pub pickup_location_lat: f64,
    pub pickup_location_lon: f64,
    pub dropoff_location_label: String,
    pub dropoff_location_lat: f64,
    pub dropoff_location_lon: f64,
    /// Two-decimal fixed string, e.g. `"10.50"`.
    pub current_cycle_hours: String,
    pub departure_time: DateTime<Utc>,
}

impl CreateTripRequest {
    pub fn new(
        current: &GeoPoint,
        pickup: &GeoPoint,
        dropoff: &GeoPoint,
        cycle_hours: f64,
        departure_time: DateTime<Utc>,
    ) -> Self {
        Self {
            name: format!("{} to {}", pickup.label, dropoff.label),
            current_location_label: current.label.clone(),
            current_location_lat: current.lat,
            current_location_lon: current.lon,
            pickup_location_label: pickup.label.clone(),
            pickup_location_lat: pickup.lat,
            pickup_location_lon: pickup.lon,
            dropoff_location_label: dropoff.label.clone(),
            dropoff_location_lat: dropoff.lat,
            dropoff_location_lon: dropoff.lon,
            current_cycle_hours: format!("{cycle_hours:.2}"),
            departure_time,
        }
    }
}

/// Response of `POST /trips/trips/`. Legs are normalized by
/// [`crate::normalize_trip`] before anything else sees them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripResponse {
    pub id: i64,
    #[serde(default)]
    pub legs: Vec<RawTripLeg>,
}

/// A leg as the backend sends it. Decimal fields may arrive as numbers or as
/// strings; every field may be missing.
#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawTripLeg {
    #[serde(default)]
    pub leg_type: LegType,
    #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
    pub start_lat: Option<f64>,
    #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
    pub start_lon: Option<f64>,
    #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
    pub end_lat: Option<f64>,
    #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
    pub end_lon: Option<f64>,
    #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
    pub duration_hours: Option<f64>,
    #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
    pub distance_miles: Option<f64>,
    #[serde(default)]
    pub start_label: Option<String>,
    #[serde(default)]
    pub end_label: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    /// Kept loose: entries that are not `[lat, lon]` number pairs are dropped
    /// during normalization.
    #[serde(default)]
    pub polyline_geometry: Option<Vec<serde_json::Value>>,
}

/// One candidate from `GET /trips/geocode/search/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub display_name: String,
    pub lat: String,
    pub lon: String,
}

impl SearchResult {
    /// Parsed coordinates, `None` when either string is not a finite number.
    pub fn coord(&self) -> Option<Coord> {
        let lat = self.lat.trim().parse::<f64>().ok()?;
        let lon = self.lon.trim().parse::<f64>().ok()?;
        Some(Coord::new(lat, lon)).filter(Coord::is_finite)
    }

    pub fn to_geo_point(&self) -> Option<GeoPoint> {
        self.coord()
            .map(|coord| GeoPoint::at(self.display_name.clone(), coord))
    }
}

/// Response of `GET /trips/geocode/reverse/`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReverseGeocodeResult {
    #[serde(default)]
    pub display_name: Option<String>,
}

impl ReverseGeocodeResult {
    pub fn label(&self) -> &str {
        self.display_name
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(FALLBACK_LOCATION_LABEL)
    }
}

/// Response of `GET /trips/trips/{id}/svg_logs/`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SvgLogsResponse {
    #[serde(default)]
    pub svg_urls: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn create_request_matches_wire_shape() {
        let departure = Utc.with_ymd_and_hms(2025, 4, 1, 12, 0, 0).unwrap();
        let req = CreateTripRequest::new(
            &GeoPoint::new("A", 39.0, -77.0),
            &GeoPoint::new("B", 40.0, -76.0),
            &GeoPoint::new("C", 41.0, -75.0),
            10.5,
            departure,
        );
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(value["name"], "B to C");
        assert_eq!(value["current_location_label"], "A");
        assert_eq!(value["pickup_location_lat"], 40.0);
        assert_eq!(value["dropoff_location_lon"], -75.0);
        assert_eq!(value["current_cycle_hours"], "10.50");
        assert_eq!(value["departure_time"], "2025-04-01T12:00:00Z");
    }

    #[test]
    fn raw_leg_accepts_strings_numbers_and_gaps() {
        let leg: RawTripLeg = serde_json::from_str(
            r#"{
                "leg_type": "fuel",
                "start_lat": "39.5",
                "start_lon": -77.25,
                "end_lat": null,
                "duration_hours": "0.50",
                "polyline_geometry": [[39.5, -77.25]]
            }"#,
        )
        .unwrap();
        assert_eq!(leg.leg_type, LegType::Fuel);
        assert_eq!(leg.start_lat, Some(39.5));
        assert_eq!(leg.start_lon, Some(-77.25));
        assert_eq!(leg.end_lat, None);
        assert_eq!(leg.end_lon, None);
        assert_eq!(leg.duration_hours, Some(0.5));
        assert_eq!(leg.distance_miles, None);
        assert_eq!(leg.polyline_geometry.as_ref().map(Vec::len), Some(1));
    }

    #[test]
    fn search_result_coordinates() {
        let hit = SearchResult {
            display_name: "San Antonio, TX".into(),
            lat: "29.4246".into(),
            lon: " -98.4951 ".into(),
        };
        assert_eq!(hit.coord(), Some(Coord::new(29.4246, -98.4951)));

        let bad = SearchResult {
            lon: "west".into(),
            ..hit
        };
        assert_eq!(bad.coord(), None);
        assert_eq!(bad.to_geo_point(), None);
    }

    #[test]
    fn reverse_label_falls_back() {
        let empty: ReverseGeocodeResult = serde_json::from_str("{}").unwrap();
        assert_eq!(empty.label(), FALLBACK_LOCATION_LABEL);
        let blank = ReverseGeocodeResult {
            display_name: Some("  ".into()),
        };
        assert_eq!(blank.label(), FALLBACK_LOCATION_LABEL);
        let named = ReverseGeocodeResult {
            display_name: Some("Reading, PA".into()),
        };
        assert_eq!(named.label(), "Reading, PA");
    }
}
