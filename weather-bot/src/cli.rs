use anyhow::Context;
use clap::{Parser, Subcommand};
use inquire::{Password, PasswordDisplayMode, Text};
use weather_core::{Config, ConfigFile, Geocoder, Reporter, TelegramBot, WeatherApiClient};
use weather_core::telegram;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather-bot", version, about = "Telegram weather bot")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the WeatherAPI key and Telegram credentials.
    Configure,

    /// Start the long-polling bot loop.
    Run,

    /// One-shot run: send a single report to the configured chat.
    Ask {
        /// Place name; prompted interactively when omitted.
        place: Option<String>,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure => configure(),

            Command::Run => {
                let config = Config::load()?;
                let bot = TelegramBot::new(config.telegram_token.clone());
                let reporter = reporter(&config);

                telegram::run_bot(&bot, &reporter).await?;
                Ok(())
            }

            Command::Ask { place } => {
                let config = Config::load()?;

                let place = match place {
                    Some(place) => place,
                    None => Text::new("Введите город:")
                        .prompt()
                        .context("Failed to read place name")?,
                };

                let report = reporter(&config).build_report(place.trim()).await;

                let bot = TelegramBot::new(config.telegram_token.clone());
                telegram::deliver(&bot, &config.telegram_chat_id, &report).await?;
                tracing::info!(chat_id = %config.telegram_chat_id, "report delivered");

                Ok(())
            }
        }
    }
}

fn reporter(config: &Config) -> Reporter {
    Reporter::new(Geocoder::new(), WeatherApiClient::new(config.weatherapi_key.clone()))
}

/// Interactive credential setup; existing values are offered as defaults.
fn configure() -> anyhow::Result<()> {
    let stored = ConfigFile::load()?;

    let weatherapi_key = Password::new("WeatherAPI key:")
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .prompt()
        .context("Failed to read WeatherAPI key")?;

    let telegram_token = Password::new("Telegram bot token:")
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .prompt()
        .context("Failed to read Telegram bot token")?;

    let telegram_chat_id = Text::new("Telegram chat id:")
        .with_initial_value(stored.telegram_chat_id.as_deref().unwrap_or_default())
        .prompt()
        .context("Failed to read Telegram chat id")?;

    let updated = ConfigFile {
        // An empty answer keeps whatever was stored before.
        weatherapi_key: Some(weatherapi_key).filter(|v| !v.is_empty()).or(stored.weatherapi_key),
        telegram_token: Some(telegram_token).filter(|v| !v.is_empty()).or(stored.telegram_token),
        telegram_chat_id: Some(telegram_chat_id)
            .filter(|v| !v.is_empty())
            .or(stored.telegram_chat_id),
    };
    updated.save()?;

    println!("Saved configuration to {}", ConfigFile::config_file_path()?.display());
    Ok(())
}
