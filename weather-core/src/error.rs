use reqwest::StatusCode;
use thiserror::Error;

/// Everything that can go wrong between a place name and a delivered report.
///
/// Pipeline errors (resolver, fetcher, formatter) propagate up to
/// [`crate::Reporter::build_report`], which is the single recovery point.
/// `Delivery` is never converted into a fallback report, and `Configuration`
/// is fatal at startup.
#[derive(Debug, Error)]
pub enum Error {
    #[error("No location found for '{0}'")]
    LocationNotFound(String),

    #[error("Request failed with status {0}")]
    RequestFailed(StatusCode),

    #[error("Malformed provider response: key '{0}' is absent")]
    MalformedResponse(&'static str),

    #[error("Key '{0}' is absent")]
    MissingField(&'static str),

    #[error("Field '{field}' has unexpected value '{value}'")]
    MalformedField { field: &'static str, value: String },

    #[error("Can not send message: {0}")]
    Delivery(String),

    #[error("Missing configuration: {}", .missing.join(", "))]
    Configuration { missing: Vec<&'static str> },

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
