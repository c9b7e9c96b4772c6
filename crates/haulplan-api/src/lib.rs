//! Wire contract of the trip-planning backend.
//!
//! Shapes here mirror the JSON the backend speaks, including its loose
//! typing (stringified coordinates, optional numeric fields). Conversion into
//! the strongly typed model in `haulplan-core` happens in [`normalize`].

mod dto;
mod errors;
pub mod normalize;
pub mod paths;

pub use dto::{
    CreateTripRequest, RawTripLeg, ReverseGeocodeResult, SearchResult, SvgLogsResponse,
    TripResponse, FALLBACK_LOCATION_LABEL,
};
pub use errors::ApiError;
pub use normalize::normalize_trip;
