// File: ./src/config.rs
// Handles configuration loading, saving, and defaults.
use crate::context::AppContext;
use crate::parser::emit::Framing;
use crate::storage::LocalStorage;
use anyhow::{Error, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;

pub const OPENAI_KEY_ENV: &str = "OPENAI_API_KEY";
pub const SENDGRID_KEY_ENV: &str = "SENDGRID_API_KEY";

fn default_llm_api_base() -> String {
    "https://api.openai.com/v1".to_string()
}
fn default_llm_model() -> String {
    "gpt-4o".to_string()
}
fn default_mail_provider_url() -> String {
    "https://api.sendgrid.com/v3/mail/send".to_string()
}
fn default_mail_from() -> String {
    "synchrohnize@gmail.com".to_string()
}
fn default_timezone() -> String {
    "America/New_York".to_string()
}
fn default_semester_weeks() -> u32 {
    15
}
fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct Config {
    #[serde(default = "default_llm_api_base")]
    pub llm_api_base: String,
    #[serde(default)]
    pub llm_api_key: String,
    #[serde(default = "default_llm_model")]
    pub llm_model: String,
    #[serde(default)]
    pub llm_temperature: Option<f32>,

    #[serde(default = "default_mail_provider_url")]
    pub mail_provider_url: String,
    #[serde(default)]
    pub mail_api_key: String,
    #[serde(default = "default_mail_from")]
    pub mail_from: String,

    #[serde(default = "default_timezone")]
    pub calendar_timezone: String,
    #[serde(default = "default_semester_weeks")]
    pub semester_weeks: u32,

    #[serde(default)]
    pub stream_framing: Framing,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            llm_api_base: default_llm_api_base(),
            llm_api_key: String::new(),
            llm_model: default_llm_model(),
            llm_temperature: None,
            mail_provider_url: default_mail_provider_url(),
            mail_api_key: String::new(),
            mail_from: default_mail_from(),
            calendar_timezone: default_timezone(),
            semester_weeks: default_semester_weeks(),
            stream_framing: Framing::default(),
            log_level: default_log_level(),
        }
    }
}

impl Config {
    /// Load the configuration from disk using an explicit context.
    /// Returns a contextualized error if reading or parsing fails.
    pub fn load(ctx: &dyn AppContext) -> Result<Self> {
        let path = ctx.get_config_file_path()?;

        if !path.exists() {
            return Err(anyhow::anyhow!("Config file not found"));
        }

        let contents = fs::read_to_string(&path).map_err(|e| {
            anyhow::anyhow!("Failed to read config file '{}': {}", path.display(), e)
        })?;

        let config: Config = toml::from_str(&contents).map_err(|e| {
            anyhow::anyhow!("Failed to parse config file '{}': {}", path.display(), e)
        })?;

        Ok(config)
    }

    /// Load from disk, fall back to defaults when no file exists, then fill
    /// empty API keys from the environment.
    pub fn load_or_default(ctx: &dyn AppContext) -> Result<Self> {
        let mut config = match Self::load(ctx) {
            Ok(c) => c,
            Err(e) if Self::is_missing_config_error(&e) => {
                log::info!("No config file found, using defaults");
                Self::default()
            }
            Err(e) => return Err(e),
        };
        config.apply_env();
        Ok(config)
    }

    /// Fill empty secrets from `OPENAI_API_KEY` / `SENDGRID_API_KEY`.
    pub fn apply_env(&mut self) {
        if self.llm_api_key.is_empty()
            && let Ok(key) = env::var(OPENAI_KEY_ENV)
        {
            self.llm_api_key = key;
        }
        if self.mail_api_key.is_empty()
            && let Ok(key) = env::var(SENDGRID_KEY_ENV)
        {
            self.mail_api_key = key;
        }
    }

    /// Helper to detect whether an anyhow::Error indicates that the config file was missing.
    pub fn is_missing_config_error(err: &Error) -> bool {
        if err.to_string().contains("Config file not found") {
            return true;
        }

        for cause in err.chain() {
            if let Some(io_err) = cause.downcast_ref::<std::io::Error>()
                && io_err.kind() == std::io::ErrorKind::NotFound
            {
                return true;
            }
        }

        false
    }

    /// Save configuration using an explicit context.
    pub fn save(&self, ctx: &dyn AppContext) -> Result<()> {
        let path = ctx.get_config_file_path()?;
        LocalStorage::with_lock(&path, || {
            let toml_str = toml::to_string_pretty(self)?;
            LocalStorage::atomic_write(&path, toml_str)?;
            Ok(())
        })?;
        Ok(())
    }

    /// Parsed calendar timezone, falling back to New York on unknown names.
    pub fn timezone(&self) -> chrono_tz::Tz {
        self.calendar_timezone.parse().unwrap_or_else(|_| {
            log::warn!(
                "Unknown calendar timezone '{}', using America/New_York",
                self.calendar_timezone
            );
            chrono_tz::America::New_York
        })
    }

    pub fn log_level(&self) -> log::LevelFilter {
        self.log_level.parse().unwrap_or(log::LevelFilter::Info)
    }
}
