use reqwest::Client;
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::model::Coordinates;

const WEATHERAPI_URL: &str = "https://api.weatherapi.com";
const LANG: &str = "ru";

/// Client for WeatherAPI.com. One forecast call returns both the current
/// conditions and the first day's astronomical block.
#[derive(Debug, Clone)]
pub struct WeatherApiClient {
    api_key: String,
    http: Client,
    base_url: String,
}

/// Decoded provider payload. Fields the formatter reads are optional; their
/// absence surfaces as `MissingField` at extraction time rather than as a
/// decode failure here.
#[derive(Debug, Clone, Deserialize)]
pub struct WeatherPayload {
    pub current: Option<Current>,
    pub forecast: Option<Forecast>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Current {
    pub temp_c: Option<f64>,
    pub wind_kph: Option<f64>,
    pub condition: Option<Condition>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Condition {
    pub text: Option<String>,
    pub icon: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Forecast {
    #[serde(default)]
    pub forecastday: Vec<ForecastDay>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ForecastDay {
    pub astro: Option<Astro>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Astro {
    pub sunrise: Option<String>,
    pub sunset: Option<String>,
    pub moonrise: Option<String>,
    pub moonset: Option<String>,
}

impl WeatherApiClient {
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(api_key, WEATHERAPI_URL.to_string())
    }

    /// Same as [`WeatherApiClient::new`] but against a custom endpoint. Used by tests.
    pub fn with_base_url(api_key: String, base_url: String) -> Self {
        Self { api_key, http: Client::new(), base_url }
    }

    /// Fetch current conditions plus the one-day forecast for a coordinate pair.
    pub async fn fetch(&self, coords: Coordinates) -> Result<WeatherPayload> {
        let url = format!("{}/v1/forecast.json", self.base_url);
        let location = format!("{} {}", coords.latitude, coords.longitude);

        let res = self
            .http
            .get(&url)
            .query(&[
                ("key", self.api_key.as_str()),
                ("q", location.as_str()),
                ("lang", LANG),
                ("days", "1"),
            ])
            .send()
            .await?;

        let status = res.status();
        let request_url = res.url().clone();
        let body = res.text().await?;

        // Raw diagnostics, matching the upstream behaviour: the request URL
        // (API key included) and the full body are logged as-is.
        tracing::debug!(url = %request_url, %body, "weatherapi response");

        if !status.is_success() {
            return Err(Error::RequestFailed(status));
        }

        let payload: WeatherPayload =
            serde_json::from_str(&body).map_err(|_| Error::MalformedResponse("current"))?;

        if payload.current.is_none() {
            return Err(Error::MalformedResponse("current"));
        }

        Ok(payload)
    }
}
