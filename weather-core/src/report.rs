//! Turns a provider payload into the message body and photo URL, and hosts
//! the pipeline's single error boundary.

use crate::error::{Error, Result};
use crate::geocode::Geocoder;
use crate::model::WeatherReport;
use crate::weather::{WeatherApiClient, WeatherPayload};

/// Three fixed-label lines with current conditions. Labels are the Russian
/// ones used by the deployed bot.
pub fn format_current(payload: &WeatherPayload) -> Result<String> {
    let current = payload.current.as_ref().ok_or(Error::MissingField("current"))?;

    let temp_c = current.temp_c.ok_or(Error::MissingField("temp_c"))?;
    let text = current
        .condition
        .as_ref()
        .and_then(|c| c.text.as_deref())
        .ok_or(Error::MissingField("text"))?;
    let wind_kph = current.wind_kph.ok_or(Error::MissingField("wind_kph"))?;

    Ok(format!(
        "Температура: {temp_c:.1} °C\nПогода: {text}\nСкорость ветра: {wind_kph:.1} км/ч\n"
    ))
}

/// Sunrise/sunset (and, when the provider sends them, moonrise/moonset)
/// lines for the first forecast day, prefixed with a blank separator line.
pub fn format_astro(payload: &WeatherPayload) -> Result<String> {
    let astro = payload
        .forecast
        .as_ref()
        .ok_or(Error::MissingField("forecast"))?
        .forecastday
        .first()
        .ok_or(Error::MissingField("forecastday"))?
        .astro
        .as_ref()
        .ok_or(Error::MissingField("astro"))?;

    let sunrise = astro.sunrise.as_deref().ok_or(Error::MissingField("sunrise"))?;
    let sunset = astro.sunset.as_deref().ok_or(Error::MissingField("sunset"))?;

    let mut out = format!(
        "\nВосход солнца: {}\nЗакат солнца: {}\n",
        strip_meridiem("sunrise", sunrise)?,
        to_24h("sunset", sunset)?,
    );

    if let Some(moonrise) = astro.moonrise.as_deref() {
        out.push_str(&format!("Восход луны: {}\n", to_24h("moonrise", moonrise)?));
    }
    if let Some(moonset) = astro.moonset.as_deref() {
        out.push_str(&format!("Закат луны: {}\n", strip_meridiem("moonset", moonset)?));
    }

    Ok(out)
}

/// Icon URL for the current condition. The provider sends a protocol-relative
/// path, so the scheme is prepended verbatim.
pub fn extract_icon(payload: &WeatherPayload) -> Result<String> {
    let icon = payload
        .current
        .as_ref()
        .ok_or(Error::MissingField("current"))?
        .condition
        .as_ref()
        .ok_or(Error::MissingField("condition"))?
        .icon
        .as_deref()
        .ok_or(Error::MissingField("icon"))?;

    Ok(format!("https:{icon}"))
}

/// Drop the trailing 3-character " AM"/" PM" marker from an "hh:mm AM/PM"
/// string, leaving the time as-is.
fn strip_meridiem(field: &'static str, value: &str) -> Result<String> {
    value
        .strip_suffix(" AM")
        .or_else(|| value.strip_suffix(" PM"))
        .map(str::to_string)
        .ok_or_else(|| Error::MalformedField { field, value: value.to_string() })
}

/// Rewrite an "hh:mm AM/PM" string to 24-hour form.
///
/// This is a fixed textual transform, not a time parse: for PM values the
/// first two characters are read as the hour, 12 is added, and the substring
/// between the hour and the marker (":mm") is carried over verbatim. AM
/// values only lose the marker.
fn to_24h(field: &'static str, value: &str) -> Result<String> {
    let stripped = strip_meridiem(field, value)?;

    if !value.ends_with(" PM") {
        return Ok(stripped);
    }

    let hour: u32 = value
        .get(..2)
        .and_then(|h| h.parse().ok())
        .ok_or_else(|| Error::MalformedField { field, value: value.to_string() })?;

    Ok(format!("{}{}", hour + 12, &value[2..value.len() - 3]))
}

/// Composes resolver, fetcher and the extractors, and owns the fallback
/// substitution. Nothing past [`Reporter::build_report`] ever sees a pipeline
/// error.
#[derive(Debug, Clone)]
pub struct Reporter {
    geocoder: Geocoder,
    weather: WeatherApiClient,
}

impl Reporter {
    pub fn new(geocoder: Geocoder, weather: WeatherApiClient) -> Self {
        Self { geocoder, weather }
    }

    /// Build a report for a free-text place name. Never fails: any stage
    /// error is logged and replaced by the fixed fallback pair.
    pub async fn build_report(&self, place: &str) -> WeatherReport {
        match self.try_build(place).await {
            Ok(report) => report,
            Err(err) => {
                tracing::error!(place, error = %err, "weather pipeline failed");
                WeatherReport::fallback()
            }
        }
    }

    async fn try_build(&self, place: &str) -> Result<WeatherReport> {
        let coords = self.geocoder.resolve(place).await?;
        let payload = self.weather.fetch(coords).await?;

        let info = format!("{}{}", format_current(&payload)?, format_astro(&payload)?);
        let photo = extract_icon(&payload)?;

        Ok(WeatherReport { info, photo })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FALLBACK_INFO, FALLBACK_PHOTO};
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn payload(value: serde_json::Value) -> WeatherPayload {
        serde_json::from_value(value).expect("test payload must decode")
    }

    #[test]
    fn current_lines_carry_temperature_condition_and_wind() {
        let payload = payload(json!({
            "current": {
                "temp_c": 28.0,
                "wind_kph": 25.9,
                "condition": { "text": "Солнечно" }
            }
        }));

        let text = format_current(&payload).unwrap();

        assert_eq!(text, "Температура: 28.0 °C\nПогода: Солнечно\nСкорость ветра: 25.9 км/ч\n");
    }

    #[test]
    fn missing_current_key_is_missing_field() {
        let payload = payload(json!({ "cur": { "temp_c": 28.0 } }));

        let err = format_current(&payload).unwrap_err();
        assert!(matches!(err, Error::MissingField("current")));
    }

    #[test]
    fn missing_condition_text_is_missing_field() {
        let payload = payload(json!({
            "current": { "temp_c": 28.0, "wind_kph": 25.9, "condition": {} }
        }));

        let err = format_current(&payload).unwrap_err();
        assert!(matches!(err, Error::MissingField("text")));
    }

    #[test]
    fn astro_converts_sunset_to_24_hour_form() {
        let payload = payload(json!({
            "forecast": { "forecastday": [
                { "astro": { "sunrise": "05:09 AM", "sunset": "09:59 PM" } }
            ]}
        }));

        let text = format_astro(&payload).unwrap();

        assert_eq!(text, "\nВосход солнца: 05:09\nЗакат солнца: 21:59\n");
    }

    #[test]
    fn astro_renders_moon_lines_when_present() {
        let payload = payload(json!({
            "forecast": { "forecastday": [
                { "astro": {
                    "sunrise": "05:09 AM",
                    "sunset": "09:59 PM",
                    "moonrise": "10:45 PM",
                    "moonset": "04:30 AM"
                } }
            ]}
        }));

        let text = format_astro(&payload).unwrap();

        assert!(text.contains("Восход луны: 22:45\n"));
        assert!(text.contains("Закат луны: 04:30\n"));
    }

    #[test]
    fn missing_forecast_key_is_missing_field() {
        let payload = payload(json!({
            "fore": { "forecastday": [ { "astro": { "sunrise": "05:09 AM" } } ] }
        }));

        let err = format_astro(&payload).unwrap_err();
        assert!(matches!(err, Error::MissingField("forecast")));
    }

    #[test]
    fn missing_sunrise_is_missing_field() {
        let payload = payload(json!({
            "forecast": { "forecastday": [ { "astro": { "sunset": "09:59 PM" } } ] }
        }));

        let err = format_astro(&payload).unwrap_err();
        assert!(matches!(err, Error::MissingField("sunrise")));
    }

    #[test]
    fn astro_value_without_meridiem_is_malformed() {
        let payload = payload(json!({
            "forecast": { "forecastday": [
                { "astro": { "sunrise": "05:09", "sunset": "09:59 PM" } }
            ]}
        }));

        let err = format_astro(&payload).unwrap_err();
        assert!(matches!(err, Error::MalformedField { field: "sunrise", .. }));
    }

    #[test]
    fn icon_url_gets_https_scheme() {
        let payload = payload(json!({
            "current": { "condition": { "icon": "//cdn/x.png" } }
        }));

        assert_eq!(extract_icon(&payload).unwrap(), "https://cdn/x.png");
    }

    #[test]
    fn missing_icon_is_missing_field() {
        let payload = payload(json!({
            "current": { "condition": { "text": "Ясно" } }
        }));

        let err = extract_icon(&payload).unwrap_err();
        assert!(matches!(err, Error::MissingField("icon")));
    }

    fn full_weather_body() -> serde_json::Value {
        json!({
            "current": {
                "temp_c": 14.0,
                "wind_kph": 6.8,
                "condition": {
                    "text": "Дымка",
                    "icon": "//cdn.weatherapi.com/weather/64x64/night/143.png"
                }
            },
            "forecast": { "forecastday": [
                { "astro": { "sunrise": "05:09 AM", "sunset": "09:59 PM" } }
            ]}
        })
    }

    fn reporter_against(server: &MockServer) -> Reporter {
        Reporter::new(
            Geocoder::with_base_url(server.uri()),
            WeatherApiClient::with_base_url("KEY".to_string(), server.uri()),
        )
    }

    async fn mount_geocoder(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "lat": "54.96", "lon": "82.95" }
            ])))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn build_report_concatenates_current_and_astro() {
        let server = MockServer::start().await;
        mount_geocoder(&server).await;
        Mock::given(method("GET"))
            .and(path("/v1/forecast.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(full_weather_body()))
            .mount(&server)
            .await;

        let report = reporter_against(&server).build_report("Новосибирск").await;

        assert_eq!(
            report.info,
            "Температура: 14.0 °C\nПогода: Дымка\nСкорость ветра: 6.8 км/ч\n\
             \nВосход солнца: 05:09\nЗакат солнца: 21:59\n"
        );
        assert_eq!(report.photo, "https://cdn.weatherapi.com/weather/64x64/night/143.png");
    }

    #[tokio::test]
    async fn build_report_is_idempotent_for_identical_responses() {
        let server = MockServer::start().await;
        mount_geocoder(&server).await;
        Mock::given(method("GET"))
            .and(path("/v1/forecast.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(full_weather_body()))
            .mount(&server)
            .await;

        let reporter = reporter_against(&server);
        let first = reporter.build_report("Новосибирск").await;
        let second = reporter.build_report("Новосибирск").await;

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn provider_failure_yields_fallback_report() {
        let server = MockServer::start().await;
        mount_geocoder(&server).await;
        Mock::given(method("GET"))
            .and(path("/v1/forecast.json"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let report = reporter_against(&server).build_report("Новосибирск").await;

        assert_eq!(report.info, FALLBACK_INFO);
        assert_eq!(report.photo, FALLBACK_PHOTO);
    }

    #[tokio::test]
    async fn unresolvable_place_yields_fallback_report() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let report = reporter_against(&server).build_report("Does not exist").await;

        assert_eq!(report, WeatherReport::fallback());
    }

    #[tokio::test]
    async fn payload_missing_astro_yields_fallback_report() {
        let server = MockServer::start().await;
        mount_geocoder(&server).await;
        Mock::given(method("GET"))
            .and(path("/v1/forecast.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "current": {
                    "temp_c": 14.0,
                    "wind_kph": 6.8,
                    "condition": { "text": "Дымка", "icon": "//cdn/x.png" }
                }
            })))
            .mount(&server)
            .await;

        let report = reporter_against(&server).build_report("Новосибирск").await;

        assert_eq!(report, WeatherReport::fallback());
    }
}
