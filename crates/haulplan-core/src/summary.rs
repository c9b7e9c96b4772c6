use crate::TripLeg;
use serde::{Deserialize, Serialize};

/// Totals shown above the leg list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TripSummary {
    pub total_miles: f64,
    pub total_hours: f64,
    pub leg_count: usize,
}

impl TripSummary {
    pub fn from_legs(legs: &[TripLeg]) -> Self {
        Self {
            total_miles: legs.iter().map(|l| l.distance_miles).sum(),
            total_hours: legs.iter().map(|l| l.duration_hours).sum(),
            leg_count: legs.len(),
        }
    }

    pub fn miles_label(&self) -> String {
        if self.total_miles.is_finite() {
            format!("{:.0}", self.total_miles)
        } else {
            "0".to_string()
        }
    }

    /// `"{h} hrs {m} min"`, whole hours plus rounded minutes.
    pub fn duration_label(&self) -> String {
        let total = if self.total_hours.is_finite() {
            self.total_hours.max(0.0)
        } else {
            0.0
        };
        let mut hours = total.floor() as u64;
        let mut minutes = ((total - total.floor()) * 60.0).round() as u64;
        if minutes == 60 {
            hours += 1;
            minutes = 0;
        }
        format!("{hours} hrs {minutes} min")
    }

    pub fn headline(&self) -> String {
        format!("{} miles, {}", self.miles_label(), self.duration_label())
    }
}
