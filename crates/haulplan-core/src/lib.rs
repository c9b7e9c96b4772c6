use serde::{Deserialize, Serialize};
use std::fmt;

pub mod bounds;
pub mod error;
pub mod leg;
pub mod role;
pub mod summary;

pub use bounds::{Bounds, compute_bounds};
pub use error::ValidationError;
pub use leg::{Accent, LegType, Trip, TripLeg};
pub use role::{LocationRole, LocationSet};
pub use summary::TripSummary;

/// Positional identity of a leg inside a trip: its index in the backend response.
///
/// Legs carry no durable backend key, so this id is only meaningful for the trip
/// it was assigned in. Reordered or partially updated legs would break it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LegId(pub usize);

impl fmt::Display for LegId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TripId(pub i64);

impl fmt::Display for TripId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A bare latitude/longitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coord {
    pub lat: f64,
    pub lon: f64,
}

impl Coord {
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    pub fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lon.is_finite()
    }
}

impl From<(f64, f64)> for Coord {
    fn from((lat, lon): (f64, f64)) -> Self {
        Self { lat, lon }
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.5}, {:.5}", self.lat, self.lon)
    }
}

/// A labelled, committed location. Replaced wholesale when the user edits it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub label: String,
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(label: impl Into<String>, lat: f64, lon: f64) -> Self {
        Self {
            label: label.into(),
            lat,
            lon,
        }
    }

    pub fn at(label: impl Into<String>, coord: Coord) -> Self {
        Self::new(label, coord.lat, coord.lon)
    }

    pub fn coord(&self) -> Coord {
        Coord::new(self.lat, self.lon)
    }
}
