use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{env, fs, path::PathBuf};

use crate::error::Error;

/// Environment variables that override the stored config, in field order.
const ENV_WEATHERAPI_KEY: &str = "WEATHERAPI_KEY";
const ENV_TELEGRAM_TOKEN: &str = "TELEGRAM_TOKEN";
const ENV_TELEGRAM_CHAT_ID: &str = "TELEGRAM_CHAT_ID";

/// On-disk configuration. Every field is optional here; requiredness is
/// enforced when building a [`Config`].
///
/// Example TOML:
/// weatherapi_key = "..."
/// telegram_token = "..."
/// telegram_chat_id = "..."
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ConfigFile {
    pub weatherapi_key: Option<String>,
    pub telegram_token: Option<String>,
    pub telegram_chat_id: Option<String>,
}

impl ConfigFile {
    /// Load the stored config, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            // First run: no config file, return empty.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: ConfigFile = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "weather-bot", "weather-bot")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }
}

/// Validated process-wide settings, read once at startup and immutable after.
#[derive(Debug, Clone)]
pub struct Config {
    pub weatherapi_key: String,
    pub telegram_token: String,
    pub telegram_chat_id: String,
}

impl Config {
    /// Build the runtime config from the stored file and the environment.
    ///
    /// Environment variables win over the file. Any required setting still
    /// absent after the merge is fatal; the error names all of them at once.
    pub fn load() -> Result<Self> {
        let file = ConfigFile::load()?;
        let cfg = Self::from_sources(&file, |name| env::var(name).ok())?;
        Ok(cfg)
    }

    fn from_sources(
        file: &ConfigFile,
        env_var: impl Fn(&str) -> Option<String>,
    ) -> crate::Result<Self> {
        let pick = |env_name: &str, stored: &Option<String>| {
            env_var(env_name)
                .filter(|v| !v.is_empty())
                .or_else(|| stored.clone().filter(|v| !v.is_empty()))
        };

        let weatherapi_key = pick(ENV_WEATHERAPI_KEY, &file.weatherapi_key);
        let telegram_token = pick(ENV_TELEGRAM_TOKEN, &file.telegram_token);
        let telegram_chat_id = pick(ENV_TELEGRAM_CHAT_ID, &file.telegram_chat_id);

        let mut missing = Vec::new();
        if weatherapi_key.is_none() {
            missing.push("weatherapi_key");
        }
        if telegram_token.is_none() {
            missing.push("telegram_token");
        }
        if telegram_chat_id.is_none() {
            missing.push("telegram_chat_id");
        }

        if !missing.is_empty() {
            return Err(Error::Configuration { missing });
        }

        Ok(Self {
            weatherapi_key: weatherapi_key.unwrap_or_default(),
            telegram_token: telegram_token.unwrap_or_default(),
            telegram_chat_id: telegram_chat_id.unwrap_or_default(),
        })
    }
}
