//! HTTP access to the trip-planning backend.
//!
//! [`TripBackend`] is the seam the interaction core talks to; [`HttpBackend`]
//! is the production implementation over `reqwest`. Tests substitute their
//! own implementations.

mod error;
mod http;

pub use error::ClientError;
pub use http::HttpBackend;

use async_trait::async_trait;
use haulplan_api::{
    CreateTripRequest, ReverseGeocodeResult, SearchResult, SvgLogsResponse, TripResponse,
};
use haulplan_core::{Coord, TripId};

#[async_trait]
pub trait TripBackend: Send + Sync {
    /// `POST /trips/trips/`
    async fn create_trip(&self, request: &CreateTripRequest) -> Result<TripResponse, ClientError>;

    /// `GET /trips/geocode/search/?q=`
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>, ClientError>;

    /// `GET /trips/geocode/reverse/?lat=&lon=`
    async fn reverse(&self, coord: Coord) -> Result<ReverseGeocodeResult, ClientError>;

    /// `POST /trips/trips/{id}/generate_svgs/`
    async fn generate_svgs(&self, trip: TripId) -> Result<(), ClientError>;

    /// `GET /trips/trips/{id}/svg_logs/`
    async fn svg_logs(&self, trip: TripId) -> Result<SvgLogsResponse, ClientError>;

    /// `GET /trips/trips/{id}/download_logs/`, the raw PDF bytes.
    async fn download_logs(&self, trip: TripId) -> Result<Vec<u8>, ClientError>;
}
