//! Address resolution via a Nominatim-style geocoding API.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use reparto_core::Coordinates;

use crate::config::GeocodingConfig;

/// Errors from address resolution.
#[derive(Debug, thiserror::Error)]
pub enum GeocodeError {
    /// The lookup succeeded but returned no match for the address.
    #[error("no match found for address")]
    NoMatch,

    /// Transport or HTTP-level failure talking to the geocoder.
    #[error("geocoding request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The geocoder answered with something we could not interpret.
    #[error("unexpected geocoder payload: {0}")]
    BadPayload(String),
}

/// Resolves a free-text postal address into coordinates.
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn resolve(&self, address: &str) -> Result<Coordinates, GeocodeError>;
}

/// One search hit from the geocoding API. Nominatim returns coordinates
/// as decimal strings.
#[derive(Debug, Deserialize)]
struct GeocodeHit {
    lat: String,
    lon: String,
}

/// HTTP client for a Nominatim-compatible `/search` endpoint.
pub struct NominatimGeocoder {
    http: reqwest::Client,
    base_url: String,
    query_suffix: Option<String>,
}

impl NominatimGeocoder {
    /// Build the client with the configured User-Agent (Nominatim requires
    /// one) and a 10 second timeout.
    ///
    /// # Errors
    ///
    /// Returns `reqwest::Error` if the client cannot be constructed.
    pub fn new(config: &GeocodingConfig) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .user_agent(&config.user_agent)
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_owned(),
            query_suffix: config.query_suffix.clone(),
        })
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn resolve(&self, address: &str) -> Result<Coordinates, GeocodeError> {
        // Scope the search to the configured locality so short street
        // addresses resolve to the right city.
        let query = match &self.query_suffix {
            Some(suffix) => format!("{address}, {suffix}"),
            None => address.to_owned(),
        };

        let hits: Vec<GeocodeHit> = self
            .http
            .get(format!("{}/search", self.base_url))
            .query(&[("q", query.as_str()), ("format", "json"), ("limit", "1")])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let hit = hits.into_iter().next().ok_or(GeocodeError::NoMatch)?;
        coordinates_from_hit(&hit)
    }
}

fn coordinates_from_hit(hit: &GeocodeHit) -> Result<Coordinates, GeocodeError> {
    let lat: f64 = hit
        .lat
        .parse()
        .map_err(|_| GeocodeError::BadPayload(format!("latitude {:?} is not a number", hit.lat)))?;
    let lng: f64 = hit.lon.parse().map_err(|_| {
        GeocodeError::BadPayload(format!("longitude {:?} is not a number", hit.lon))
    })?;

    Coordinates::new(lat, lng).map_err(|e| GeocodeError::BadPayload(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_decimal_string_coordinates() {
        let hit = GeocodeHit {
            lat: "-31.2503".to_owned(),
            lon: "-61.4867".to_owned(),
        };
        let coords = coordinates_from_hit(&hit).expect("valid hit");
        assert!((coords.lat() - -31.2503).abs() < f64::EPSILON);
        assert!((coords.lng() - -61.4867).abs() < f64::EPSILON);
    }

    #[test]
    fn rejects_non_numeric_coordinates() {
        let hit = GeocodeHit {
            lat: "not-a-number".to_owned(),
            lon: "-61.4867".to_owned(),
        };
        assert!(matches!(
            coordinates_from_hit(&hit),
            Err(GeocodeError::BadPayload(_))
        ));
    }

    #[test]
    fn rejects_out_of_range_coordinates() {
        let hit = GeocodeHit {
            lat: "95.0".to_owned(),
            lon: "0.0".to_owned(),
        };
        assert!(matches!(
            coordinates_from_hit(&hit),
            Err(GeocodeError::BadPayload(_))
        ));
    }
}
