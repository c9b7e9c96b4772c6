use crate::dto::{RawTripLeg, TripResponse};
use haulplan_core::{Coord, LegId, Trip, TripId, TripLeg};

/// Converts a backend response into a [`Trip`].
///
/// Leg ids are assigned from response order. Missing numeric fields become
/// `0`, missing geometry becomes an empty path and malformed geometry entries
/// are dropped.
pub fn normalize_trip(response: TripResponse) -> Trip {
    let legs = response
        .legs
        .into_iter()
        .enumerate()
        .map(|(index, raw)| normalize_leg(LegId(index), raw))
        .collect();
    Trip {
        id: TripId(response.id),
        legs,
    }
}

fn normalize_leg(id: LegId, raw: RawTripLeg) -> TripLeg {
    TripLeg {
        id,
        leg_type: raw.leg_type,
        start_lat: raw.start_lat,
        start_lon: raw.start_lon,
        end_lat: raw.end_lat,
        end_lon: raw.end_lon,
        duration_hours: raw.duration_hours.unwrap_or(0.0),
        distance_miles: raw.distance_miles.unwrap_or(0.0),
        start_label: raw.start_label,
        end_label: raw.end_label,
        notes: raw.notes,
        polyline_geometry: raw
            .polyline_geometry
            .unwrap_or_default()
            .iter()
            .filter_map(parse_pair)
            .collect(),
    }
}

fn parse_pair(value: &serde_json::Value) -> Option<Coord> {
    match value.as_array()?.as_slice() {
        [lat, lon] => Some(Coord::new(lat.as_f64()?, lon.as_f64()?)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use haulplan_core::LegType;

    #[test]
    fn ids_are_positional_and_gaps_default() {
        let response: TripResponse = serde_json::from_str(
            r#"{
                "id": 12,
                "legs": [
                    {"id": 900, "leg_type": "pickup", "notes": "Loading"},
                    {"leg_type": "drive", "distance_miles": 88.5,
                     "polyline_geometry": [[40.0, -76.0], [40.5, "bad"], [41.0], [41.0, -75.0]]},
                    {"leg_type": "dropoff"}
                ]
            }"#,
        )
        .unwrap();

        let trip = normalize_trip(response);
        assert_eq!(trip.id, TripId(12));
        assert_eq!(trip.len(), 3);
        let ids: Vec<_> = trip.legs.iter().map(|l| l.id).collect();
        assert_eq!(ids, vec![LegId(0), LegId(1), LegId(2)]);

        let pickup = &trip.legs[0];
        assert_eq!(pickup.leg_type, LegType::Pickup);
        assert_eq!(pickup.duration_hours, 0.0);
        assert_eq!(pickup.distance_miles, 0.0);
        assert!(pickup.polyline_geometry.is_empty());

        let drive = &trip.legs[1];
        assert_eq!(drive.distance_miles, 88.5);
        assert_eq!(
            drive.polyline_geometry,
            vec![Coord::new(40.0, -76.0), Coord::new(41.0, -75.0)]
        );
    }

    #[test]
    fn missing_legs_is_an_empty_trip() {
        let response: TripResponse = serde_json::from_str(r#"{"id": 3}"#).unwrap();
        let trip = normalize_trip(response);
        assert!(trip.is_empty());
    }
}
