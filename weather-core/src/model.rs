/// Latitude/longitude pair produced by the geocoder. Value equality only.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// Text shown to the user when any pipeline stage fails.
pub const FALLBACK_INFO: &str = "Oops, something went wrong!";

/// Image sent alongside [`FALLBACK_INFO`].
pub const FALLBACK_PHOTO: &str =
    "https://encrypted-tbn0.gstatic.com/images?q=tbn:ANd9GcQuIsbz9QvAixpDw1Rjghft9tusNgYw3alFVx6MkzOo&s";

/// Terminal artifact of the pipeline: the message body and the photo URL.
///
/// Always fully populated: either both fields carry real data, or both carry
/// the fixed fallback pair from [`WeatherReport::fallback`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeatherReport {
    pub info: String,
    pub photo: String,
}

impl WeatherReport {
    pub fn fallback() -> Self {
        Self { info: FALLBACK_INFO.to_string(), photo: FALLBACK_PHOTO.to_string() }
    }
}
