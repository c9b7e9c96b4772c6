use crate::LocationRole;
use thiserror::Error;

/// Input rejected on the client before anything reaches the network.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("{0} location is not set")]
    MissingLocation(LocationRole),
    #[error("cycle hours must be between 0 and {max}, got {value}")]
    CycleHoursOutOfRange { value: f64, max: f64 },
    #[error("coordinate is not a finite number")]
    NonFiniteCoordinate,
    #[error("trip is already planned; reset before editing")]
    TripLocked,
}

impl ValidationError {
    /// Text suitable for a warning toast.
    pub fn user_message(&self) -> String {
        match self {
            Self::MissingLocation(_) => {
                "Please set current, pickup, and dropoff locations.".to_string()
            }
            other => {
                let mut msg = other.to_string();
                if let Some(first) = msg.get_mut(0..1) {
                    first.make_ascii_uppercase();
                }
                msg
            }
        }
    }
}
