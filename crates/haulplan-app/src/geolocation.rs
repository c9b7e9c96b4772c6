use async_trait::async_trait;
use haulplan_api::ApiError;
use haulplan_core::Coord;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GeolocationError {
    #[error("location permission denied")]
    PermissionDenied,
    #[error("location unavailable")]
    Unavailable,
    #[error("location request timed out")]
    Timeout,
}

impl GeolocationError {
    pub fn user_message(&self) -> &'static str {
        match self {
            GeolocationError::PermissionDenied => {
                "Location access was denied. Pick your location on the map instead."
            }
            GeolocationError::Unavailable => "Your location is not available right now.",
            GeolocationError::Timeout => "Finding your location took too long. Please try again.",
        }
    }
}

impl From<&GeolocationError> for ApiError {
    fn from(error: &GeolocationError) -> Self {
        let message = error.user_message();
        match error {
            GeolocationError::PermissionDenied => ApiError::permission_denied(message),
            GeolocationError::Unavailable => ApiError::not_found(message),
            GeolocationError::Timeout => ApiError::timeout(message),
        }
    }
}

/// Device location source for the "use my location" action.
#[async_trait]
pub trait GeolocationProvider: Send + Sync {
    async fn locate(&self) -> Result<Coord, GeolocationError>;
}

/// Always reports the same position. Used by the CLI and tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedLocation(pub Coord);

#[async_trait]
impl GeolocationProvider for FixedLocation {
    async fn locate(&self) -> Result<Coord, GeolocationError> {
        if self.0.is_finite() {
            Ok(self.0)
        } else {
            Err(GeolocationError::Unavailable)
        }
    }
}
