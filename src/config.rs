//! Configuration loading.
//!
//! Settings come from an optional TOML file layered under `HOSTWATCH_*`
//! environment variables:
//!
//! ```toml
//! webhook_url = "https://api.day.app/yourkey/"
//! title = "P8 test server"
//! threshold_memory = 30.0
//! threshold_cpu = 50.0
//! cooldown_seconds = 1200
//! regions = ["Chengdu", "Lhasa"]
//! report_hours = [6, 12, 18]
//! utc_offset_hours = 8
//! ```
//!
//! List values in the environment are comma-separated
//! (`HOSTWATCH_REGIONS=Chengdu,Lhasa`).

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{FixedOffset, Offset, Utc};
use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;
use thiserror::Error;

use crate::data::Thresholds;

/// Config file read when no path is given. It is optional.
pub const DEFAULT_CONFIG_FILE: &str = "hostwatch.toml";

/// What happens to the rate-limit timestamp when delivery fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryPolicy {
    /// Record the send attempt even if the webhook call failed.
    #[default]
    AlwaysPersist,
    /// Only record successful deliveries, so the next cycle retries.
    OnSuccess,
}

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("webhook_url is required (set it in the config file, HOSTWATCH_WEBHOOK_URL or --webhook-url)")]
    MissingWebhookUrl,

    #[error("report hour {0} is outside 0-23")]
    InvalidReportHour(u32),

    #[error("utc_offset_hours {0} is outside -23..=23")]
    InvalidUtcOffset(i32),

    #[error("{0} must be greater than zero")]
    ZeroInterval(&'static str),

    #[error("{0} must be a finite number")]
    InvalidThreshold(&'static str),
}

/// All recognised options.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub webhook_url: String,
    pub title: String,
    pub report_title: String,

    pub threshold_memory: f64,
    pub threshold_cpu: f64,
    pub threshold_temperature: Option<f64>,
    pub threshold_precipitation: Option<f64>,
    pub threshold_precipitation_chance: Option<f64>,

    pub cooldown_seconds: u64,
    pub poll_interval_seconds: u64,
    pub alert_interval_seconds: u64,

    pub regions: Vec<String>,
    pub report_hours: Vec<u32>,
    pub utc_offset_hours: i32,

    pub state_file: PathBuf,
    pub delivery_policy: DeliveryPolicy,

    pub command_timeout_seconds: u64,
    pub http_timeout_seconds: u64,
    pub weather_endpoint: String,
    pub ps_program: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            webhook_url: String::new(),
            title: "Server alert".to_string(),
            report_title: "Weather report".to_string(),
            threshold_memory: 30.0,
            threshold_cpu: 30.0,
            threshold_temperature: None,
            threshold_precipitation: None,
            threshold_precipitation_chance: None,
            cooldown_seconds: 1200,
            poll_interval_seconds: 60,
            alert_interval_seconds: 3600,
            regions: Vec::new(),
            report_hours: vec![6, 12, 18],
            utc_offset_hours: 8,
            state_file: PathBuf::from("hostwatch-state.txt"),
            delivery_policy: DeliveryPolicy::AlwaysPersist,
            command_timeout_seconds: 10,
            http_timeout_seconds: 10,
            weather_endpoint: "https://wttr.in".to_string(),
            ps_program: "ps".to_string(),
        }
    }
}

impl Settings {
    /// Load settings from `path` (or the optional default file) and the
    /// environment. The result is not validated; call [`Settings::validate`]
    /// once any command-line overrides have been applied.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_layered(path, environment())
    }

    // Environment values win over the file.
    fn load_layered(path: Option<&Path>, env: Environment) -> Result<Self, ConfigError> {
        let file = match path {
            Some(path) => File::from(path).format(FileFormat::Toml).required(true),
            None => File::new(DEFAULT_CONFIG_FILE, FileFormat::Toml).required(false),
        };

        let config = Config::builder()
            .add_source(file)
            .add_source(env)
            .build()?;

        Ok(config.try_deserialize()?)
    }

    /// Parse settings from a TOML string, ignoring the environment.
    pub fn from_toml(toml: &str) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()?;

        Ok(config.try_deserialize()?)
    }

    /// Reject settings the agent cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.webhook_url.trim().is_empty() {
            return Err(ConfigError::MissingWebhookUrl);
        }
        if let Some(&hour) = self.report_hours.iter().find(|&&h| h > 23) {
            return Err(ConfigError::InvalidReportHour(hour));
        }
        if !(-23..=23).contains(&self.utc_offset_hours) {
            return Err(ConfigError::InvalidUtcOffset(self.utc_offset_hours));
        }
        if self.poll_interval_seconds == 0 {
            return Err(ConfigError::ZeroInterval("poll_interval_seconds"));
        }
        if self.alert_interval_seconds == 0 {
            return Err(ConfigError::ZeroInterval("alert_interval_seconds"));
        }

        let thresholds = [
            ("threshold_memory", Some(self.threshold_memory)),
            ("threshold_cpu", Some(self.threshold_cpu)),
            ("threshold_temperature", self.threshold_temperature),
            ("threshold_precipitation", self.threshold_precipitation),
            (
                "threshold_precipitation_chance",
                self.threshold_precipitation_chance,
            ),
        ];
        for (name, value) in thresholds {
            if value.is_some_and(|v| !v.is_finite()) {
                return Err(ConfigError::InvalidThreshold(name));
            }
        }

        Ok(())
    }

    pub fn thresholds(&self) -> Thresholds {
        Thresholds {
            memory: self.threshold_memory,
            cpu: self.threshold_cpu,
            temperature: self.threshold_temperature,
            precipitation: self.threshold_precipitation,
            precipitation_chance: self.threshold_precipitation_chance,
        }
    }

    /// Whether any weather threshold is configured.
    pub fn has_weather_thresholds(&self) -> bool {
        self.threshold_temperature.is_some()
            || self.threshold_precipitation.is_some()
            || self.threshold_precipitation_chance.is_some()
    }

    /// Configured regions with blanks and duplicates removed, first
    /// occurrence kept.
    pub fn unique_regions(&self) -> Vec<String> {
        let mut regions: Vec<String> = Vec::with_capacity(self.regions.len());
        for region in &self.regions {
            let region = region.trim();
            if !region.is_empty() && !regions.iter().any(|r| r == region) {
                regions.push(region.to_string());
            }
        }
        regions
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_seconds)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_seconds)
    }

    pub fn alert_interval(&self) -> Duration {
        Duration::from_secs(self.alert_interval_seconds)
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_seconds)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_seconds)
    }

    /// The fixed offset report hours are interpreted in.
    ///
    /// Falls back to UTC for an out-of-range offset; [`Settings::validate`]
    /// rejects those up front.
    pub fn utc_offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.utc_offset_hours * 3600).unwrap_or_else(|| Utc.fix())
    }
}

fn environment() -> Environment {
    Environment::with_prefix("HOSTWATCH")
        .try_parsing(true)
        .list_separator(",")
        .with_list_parse_key("regions")
        .with_list_parse_key("report_hours")
}
