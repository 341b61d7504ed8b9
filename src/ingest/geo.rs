//! Address geolocation
//!
//! The lookup service answers `GET <base>/<address>` with either
//! `{"lat": .., "lon": ..}` or `{"error": ".."}`.

use std::future::Future;

use reqwest::{Client, Url};
use serde::Deserialize;

use super::errors::{IngestError, IngestResult};

/// Latitude and longitude of an address
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoLocation {
    pub lat: f64,
    pub lon: f64,
}

/// Resolves building addresses to coordinates
pub trait Geocoder: Send + Sync {
    fn resolve(&self, address: &str) -> impl Future<Output = IngestResult<GeoLocation>> + Send;
}

/// Body of a lookup response
#[derive(Debug, Deserialize)]
pub struct GeoResponse {
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub error: Option<String>,
}

impl GeoResponse {
    pub fn into_location(self, address: &str) -> IngestResult<GeoLocation> {
        match (self.lat, self.lon, self.error) {
            (_, _, Some(error)) => Err(IngestError::geocode(address, error)),
            (Some(lat), Some(lon), None) => Ok(GeoLocation { lat, lon }),
            _ => Err(IngestError::geocode(address, "response has no coordinates")),
        }
    }
}

/// Geocoder backed by the HTTP lookup service
#[derive(Debug, Clone)]
pub struct HttpGeocoder {
    client: Client,
    base_url: Url,
}

impl HttpGeocoder {
    pub fn new(base_url: &str) -> IngestResult<Self> {
        let base_url =
            Url::parse(base_url).map_err(|e| IngestError::GeocoderUrl(e.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(IngestError::GeocoderUrl(base_url.to_string()));
        }
        Ok(Self {
            client: Client::new(),
            base_url,
        })
    }

    /// Lookup URL with the address appended as one percent-encoded segment
    pub fn lookup_url(&self, address: &str) -> IngestResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| IngestError::GeocoderUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .push(address);
        Ok(url)
    }
}

impl Geocoder for HttpGeocoder {
    async fn resolve(&self, address: &str) -> IngestResult<GeoLocation> {
        let url = self.lookup_url(address)?;
        tracing::debug!(%url, "geocoding address");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| IngestError::geocode(address, e))?;
        let body: GeoResponse = response
            .json()
            .await
            .map_err(|e| IngestError::geocode(address, e))?;
        body.into_location(address)
    }
}
