use crate::error::ValidationError;
use crate::leg::Accent;
use crate::{Coord, GeoPoint};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which of the three trip locations is being talked about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocationRole {
    Current,
    Pickup,
    Dropoff,
}

impl LocationRole {
    pub const ALL: [LocationRole; 3] = [Self::Current, Self::Pickup, Self::Dropoff];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Current => "current",
            Self::Pickup => "pickup",
            Self::Dropoff => "dropoff",
        }
    }

    /// Marker colour for the committed location of this role.
    pub fn accent(self) -> Accent {
        match self {
            Self::Current => Accent::Error,
            Self::Pickup => Accent::Info,
            Self::Dropoff => Accent::Success,
        }
    }

    /// Heading used on the map popup, e.g. `PICKUP LOCATION`.
    pub fn popup_heading(self) -> String {
        format!("{} LOCATION", self.as_str().to_ascii_uppercase())
    }
}

impl fmt::Display for LocationRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The three committed trip locations, each optional until the user confirms it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocationSet {
    pub current: Option<GeoPoint>,
    pub pickup: Option<GeoPoint>,
    pub dropoff: Option<GeoPoint>,
}

/// All three locations, guaranteed present.
#[derive(Debug, Clone, PartialEq)]
pub struct CompleteLocations<'a> {
    pub current: &'a GeoPoint,
    pub pickup: &'a GeoPoint,
    pub dropoff: &'a GeoPoint,
}

impl LocationSet {
    pub fn get(&self, role: LocationRole) -> Option<&GeoPoint> {
        match role {
            LocationRole::Current => self.current.as_ref(),
            LocationRole::Pickup => self.pickup.as_ref(),
            LocationRole::Dropoff => self.dropoff.as_ref(),
        }
    }

    /// Replaces the value for `role` wholesale; `None` clears it.
    pub fn set(&mut self, role: LocationRole, point: Option<GeoPoint>) {
        let slot = match role {
            LocationRole::Current => &mut self.current,
            LocationRole::Pickup => &mut self.pickup,
            LocationRole::Dropoff => &mut self.dropoff,
        };
        *slot = point;
    }

    pub fn is_complete(&self) -> bool {
        LocationRole::ALL.iter().all(|role| self.get(*role).is_some())
    }

    /// Checks that every role is set, reporting the first missing one.
    pub fn require_all(&self) -> Result<CompleteLocations<'_>, ValidationError> {
        match (&self.current, &self.pickup, &self.dropoff) {
            (Some(current), Some(pickup), Some(dropoff)) => Ok(CompleteLocations {
                current,
                pickup,
                dropoff,
            }),
            _ => {
                let missing = LocationRole::ALL
                    .into_iter()
                    .find(|role| self.get(*role).is_none())
                    .unwrap_or(LocationRole::Current);
                Err(ValidationError::MissingLocation(missing))
            }
        }
    }

    /// Coordinates of whichever roles are set, in role order.
    pub fn coords(&self) -> Vec<Coord> {
        LocationRole::ALL
            .iter()
            .filter_map(|role| self.get(*role))
            .map(GeoPoint::coord)
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (LocationRole, &GeoPoint)> {
        LocationRole::ALL
            .into_iter()
            .filter_map(|role| self.get(role).map(|point| (role, point)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(label: &str) -> GeoPoint {
        GeoPoint::new(label, 40.0, -75.0)
    }

    #[test]
    fn require_all_reports_first_missing_role() {
        let mut set = LocationSet::default();
        set.set(LocationRole::Pickup, Some(point("B")));
        set.set(LocationRole::Dropoff, Some(point("C")));
        assert_eq!(
            set.require_all().unwrap_err(),
            ValidationError::MissingLocation(LocationRole::Current)
        );

        set.set(LocationRole::Current, Some(point("A")));
        set.set(LocationRole::Dropoff, None);
        assert_eq!(
            set.require_all().unwrap_err(),
            ValidationError::MissingLocation(LocationRole::Dropoff)
        );
    }

    #[test]
    fn set_replaces_wholesale() {
        let mut set = LocationSet::default();
        set.set(LocationRole::Current, Some(point("A")));
        set.set(LocationRole::Current, Some(GeoPoint::new("A2", 1.0, 2.0)));
        assert_eq!(set.current.as_ref().unwrap().label, "A2");
        assert_eq!(set.coords(), vec![Coord::new(1.0, 2.0)]);
    }

    #[test]
    fn role_serializes_lowercase() {
        let json = serde_json::to_string(&LocationRole::Dropoff).unwrap();
        assert_eq!(json, "\"dropoff\"");
        assert_eq!(LocationRole::Pickup.popup_heading(), "PICKUP LOCATION");
    }
}
