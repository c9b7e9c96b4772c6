use crate::{Coord, LegId, TripId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of trip segment. Unknown kinds from the backend land in `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LegType {
    Drive,
    Rest,
    Fuel,
    Break,
    Pickup,
    Dropoff,
    #[default]
    #[serde(other)]
    Other,
}

/// Palette role used to colour markers, paths and cards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Accent {
    Primary,
    Secondary,
    Success,
    Info,
    Warning,
    Error,
}

impl LegType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Drive => "drive",
            Self::Rest => "rest",
            Self::Fuel => "fuel",
            Self::Break => "break",
            Self::Pickup => "pickup",
            Self::Dropoff => "dropoff",
            Self::Other => "other",
        }
    }

    pub fn accent(self) -> Accent {
        match self {
            Self::Pickup => Accent::Primary,
            Self::Dropoff => Accent::Secondary,
            Self::Drive => Accent::Success,
            Self::Rest => Accent::Info,
            Self::Break => Accent::Warning,
            Self::Fuel => Accent::Error,
            Self::Other => Accent::Info,
        }
    }

    /// Drive legs only render as a path, never as a discrete marker.
    pub fn has_marker(self) -> bool {
        self != Self::Drive
    }
}

impl fmt::Display for LegType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripLeg {
    pub id: LegId,
    pub leg_type: LegType,
    pub start_lat: Option<f64>,
    pub start_lon: Option<f64>,
    pub end_lat: Option<f64>,
    pub end_lon: Option<f64>,
    pub duration_hours: f64,
    pub distance_miles: f64,
    pub start_label: Option<String>,
    pub end_label: Option<String>,
    pub notes: Option<String>,
    pub polyline_geometry: Vec<Coord>,
}

impl TripLeg {
    /// A leg with no geometry and zeroed measurements.
    pub fn new(id: LegId, leg_type: LegType) -> Self {
        Self {
            id,
            leg_type,
            start_lat: None,
            start_lon: None,
            end_lat: None,
            end_lon: None,
            duration_hours: 0.0,
            distance_miles: 0.0,
            start_label: None,
            end_label: None,
            notes: None,
            polyline_geometry: Vec::new(),
        }
    }

    pub fn start(&self) -> Option<Coord> {
        Some(Coord::new(self.start_lat?, self.start_lon?))
    }

    pub fn end(&self) -> Option<Coord> {
        Some(Coord::new(self.end_lat?, self.end_lon?))
    }

    /// Where the leg's marker sits: the first polyline point, falling back to
    /// the start and then the end coordinate.
    pub fn marker_position(&self) -> Option<Coord> {
        self.polyline_geometry
            .first()
            .copied()
            .filter(Coord::is_finite)
            .or_else(|| self.start().filter(Coord::is_finite))
            .or_else(|| self.end().filter(Coord::is_finite))
    }

    pub fn has_marker(&self) -> bool {
        self.leg_type.has_marker() && self.marker_position().is_some()
    }

    /// The drawable path, if the geometry has at least two points.
    pub fn path(&self) -> Option<&[Coord]> {
        (self.polyline_geometry.len() > 1).then_some(self.polyline_geometry.as_slice())
    }

    pub fn popup_text(&self) -> &str {
        [&self.notes, &self.start_label, &self.end_label]
            .into_iter()
            .flatten()
            .map(String::as_str)
            .find(|s| !s.is_empty())
            .unwrap_or("No label")
    }

    pub fn popup_title(&self) -> String {
        self.leg_type.as_str().to_ascii_uppercase()
    }

    pub fn duration_label(&self) -> String {
        format!("{:.2} hrs", self.duration_hours)
    }

    pub fn distance_label(&self) -> String {
        format!("{:.1} mi", self.distance_miles)
    }
}

/// A planned trip, created atomically from one backend response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trip {
    pub id: TripId,
    pub legs: Vec<TripLeg>,
}

impl Trip {
    pub fn leg(&self, id: LegId) -> Option<&TripLeg> {
        self.legs.get(id.0)
    }

    pub fn len(&self) -> usize {
        self.legs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.legs.is_empty()
    }
}
