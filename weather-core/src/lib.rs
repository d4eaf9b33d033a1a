//! Core library for the `weather-bot` Telegram bot.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - Place-name geocoding and the weather provider client
//! - Report formatting and the pipeline's fallback error boundary
//! - Telegram delivery (long polling, text messages, photos)
//!
//! It is used by `weather-bot`, but can also be reused by other binaries or services.

pub mod config;
pub mod error;
pub mod geocode;
pub mod model;
pub mod report;
pub mod telegram;
pub mod weather;

pub use config::{Config, ConfigFile};
pub use error::{Error, Result};
pub use geocode::Geocoder;
pub use model::{Coordinates, WeatherReport};
pub use report::Reporter;
pub use telegram::{Messenger, TelegramBot};
pub use weather::{WeatherApiClient, WeatherPayload};
