//! Place-name geocoding via Nominatim (OpenStreetMap). Free, no API key.

use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::model::Coordinates;

const NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org";
const REQUEST_TIMEOUT_SECS: u64 = 10;
// Nominatim's usage policy requires an identifying User-Agent.
const USER_AGENT: &str = concat!("weather-bot/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Deserialize)]
struct SearchResult {
    lat: String,
    lon: String,
}

/// Resolves free-text place names to coordinates. First match wins; there is
/// no disambiguation, no caching and no retry.
#[derive(Debug, Clone)]
pub struct Geocoder {
    http: Client,
    base_url: String,
}

impl Default for Geocoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Geocoder {
    pub fn new() -> Self {
        Self::with_base_url(NOMINATIM_URL.to_string())
    }

    /// Same as [`Geocoder::new`] but against a custom endpoint. Used by tests.
    pub fn with_base_url(base_url: String) -> Self {
        Self { http: Client::new(), base_url }
    }

    /// Resolve a place name to its first-match coordinates.
    pub async fn resolve(&self, place: &str) -> Result<Coordinates> {
        let url = format!("{}/search", self.base_url);

        let res = self
            .http
            .get(&url)
            .query(&[("q", place), ("format", "json"), ("limit", "1")])
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            return Err(Error::RequestFailed(status));
        }

        let results: Vec<SearchResult> = res.json().await?;

        let first = results
            .into_iter()
            .next()
            .ok_or_else(|| Error::LocationNotFound(place.to_string()))?;

        // Nominatim serves coordinates as strings.
        let latitude = first.lat.parse::<f64>();
        let longitude = first.lon.parse::<f64>();
        let (Ok(latitude), Ok(longitude)) = (latitude, longitude) else {
            return Err(Error::LocationNotFound(place.to_string()));
        };

        tracing::debug!(place, latitude, longitude, "resolved place");

        Ok(Coordinates { latitude, longitude })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn geocoder_against(server: &MockServer) -> Geocoder {
        Geocoder::with_base_url(server.uri())
    }

    #[tokio::test]
    async fn resolve_takes_first_match() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("q", "Новосибирск"))
            .and(query_param("limit", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "lat": "54.96781445", "lon": "82.95159894278376" }
            ])))
            .mount(&server)
            .await;

        let coords = geocoder_against(&server).resolve("Новосибирск").await.unwrap();

        assert!(coords.latitude.is_finite());
        assert!(coords.longitude.is_finite());
        assert_eq!(coords.latitude, 54.96781445);
        assert_eq!(coords.longitude, 82.95159894278376);
    }

    #[tokio::test]
    async fn unresolvable_place_is_location_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let err = geocoder_against(&server).resolve("Does not exist").await.unwrap_err();

        assert!(matches!(err, Error::LocationNotFound(ref place) if place == "Does not exist"));
    }

    #[tokio::test]
    async fn unparsable_coordinates_are_location_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "lat": "not-a-number", "lon": "82.95" }
            ])))
            .mount(&server)
            .await;

        let err = geocoder_against(&server).resolve("Glitch").await.unwrap_err();

        assert!(matches!(err, Error::LocationNotFound(_)));
    }

    #[tokio::test]
    async fn non_success_status_is_request_failed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = geocoder_against(&server).resolve("Moscow").await.unwrap_err();

        assert!(matches!(err, Error::RequestFailed(status) if status.as_u16() == 503));
    }
}
