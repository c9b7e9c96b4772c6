use crate::{ClientError, TripBackend};
use async_trait::async_trait;
use haulplan_api::{
    CreateTripRequest, ReverseGeocodeResult, SearchResult, SvgLogsResponse, TripResponse, paths,
};
use haulplan_core::{Coord, TripId};
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

const USER_AGENT: &str = concat!("haulplan/", env!("CARGO_PKG_VERSION"));

/// [`TripBackend`] over HTTP.
///
/// Every request carries the client-wide timeout; expiry surfaces as
/// [`ClientError::Timeout`].
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ClientError> {
        let base_url = base_url.into();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ClientError::InvalidUrl(base_url));
        }
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        debug!(%method, %url, "backend request");
        self.client.request(method, url)
    }

    async fn send(builder: RequestBuilder) -> Result<Response, ClientError> {
        let response = builder.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(ClientError::Status {
            status: status.as_u16(),
            body,
        })
    }

    async fn send_json<T: DeserializeOwned>(builder: RequestBuilder) -> Result<T, ClientError> {
        let bytes = Self::send(builder).await?.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[async_trait]
impl TripBackend for HttpBackend {
    async fn create_trip(&self, request: &CreateTripRequest) -> Result<TripResponse, ClientError> {
        Self::send_json(self.request(Method::POST, paths::TRIPS).json(request)).await
    }

    async fn search(&self, query: &str) -> Result<Vec<SearchResult>, ClientError> {
        Self::send_json(
            self.request(Method::GET, paths::GEOCODE_SEARCH)
                .query(&[("q", query)]),
        )
        .await
    }

    async fn reverse(&self, coord: Coord) -> Result<ReverseGeocodeResult, ClientError> {
        Self::send_json(
            self.request(Method::GET, paths::GEOCODE_REVERSE)
                .query(&[("lat", coord.lat.to_string()), ("lon", coord.lon.to_string())]),
        )
        .await
    }

    async fn generate_svgs(&self, trip: TripId) -> Result<(), ClientError> {
        Self::send(self.request(Method::POST, &paths::generate_svgs(trip))).await?;
        Ok(())
    }

    async fn svg_logs(&self, trip: TripId) -> Result<SvgLogsResponse, ClientError> {
        Self::send_json(self.request(Method::GET, &paths::svg_logs(trip))).await
    }

    async fn download_logs(&self, trip: TripId) -> Result<Vec<u8>, ClientError> {
        let bytes = Self::send(self.request(Method::GET, &paths::download_logs(trip)))
            .await?
            .bytes()
            .await?;
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_http_base_url() {
        let err = HttpBackend::new("ftp://example.com", Duration::from_secs(1)).unwrap_err();
        assert!(matches!(err, ClientError::InvalidUrl(_)));
    }

    #[test]
    fn trailing_slash_is_trimmed() {
        let backend = HttpBackend::new("http://localhost:8000/", Duration::from_secs(1)).unwrap();
        assert_eq!(backend.base_url(), "http://localhost:8000");
    }
}
