use serde::{Deserialize, Deserializer};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::predict::{PredictError, Satellite};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid value for {field}: {message}")]
    Invalid { field: &'static str, message: String },
    #[error("invalid default satellite: {0}")]
    Satellite(#[from] PredictError),
}

/// The ISS as published when this service was set up. Requests that carry
/// no TLE of their own are answered for this satellite.
pub const DEFAULT_TLE_NAME: &str = "ISS (ZARYA)";
pub const DEFAULT_TLE_LINE1: &str =
    "1 25544U 98067A   26008.88709191  .00008359  00000-0  15864-3 0  9991";
pub const DEFAULT_TLE_LINE2: &str =
    "2 25544  51.6333   8.0698 0007663 356.5554   3.5381 15.49180370547069";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub web: WebConfig,
    pub store: StoreConfig,
    pub predict: PredictConfig,
    pub trajectory: TrajectoryConfig,
    pub notifications: NotificationsConfig,
    pub transport: TransportConfig,
    pub satellite: Option<SatelliteConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "0.0.0.0:8080".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

fn default_store_path() -> PathBuf {
    PathBuf::from("notifications.db")
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PredictConfig {
    #[serde(deserialize_with = "deserialize_duration")]
    pub search_window: Duration,
    pub min_elevation_deg: f64,
    pub max_sun_altitude_deg: f64,
    pub horizon_deg: f64,
}

impl Default for PredictConfig {
    fn default() -> Self {
        Self {
            search_window: Duration::from_secs(4 * 24 * 3600),
            min_elevation_deg: 10.0,
            max_sun_altitude_deg: -6.0,
            horizon_deg: 0.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TrajectoryConfig {
    #[serde(deserialize_with = "deserialize_duration")]
    pub horizon: Duration,
    #[serde(deserialize_with = "deserialize_duration")]
    pub step: Duration,
    #[serde(deserialize_with = "deserialize_duration")]
    pub ttl: Duration,
}

impl Default for TrajectoryConfig {
    fn default() -> Self {
        Self {
            horizon: Duration::from_secs(60 * 60),
            step: Duration::from_secs(2 * 60),
            ttl: Duration::from_secs(30 * 60),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NotificationsConfig {
    #[serde(deserialize_with = "deserialize_duration")]
    pub lead_time: Duration,
    #[serde(deserialize_with = "deserialize_duration")]
    pub dispatch_interval: Duration,
    #[serde(deserialize_with = "deserialize_optional_duration")]
    pub send_timeout: Option<Duration>,
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            lead_time: Duration::from_secs(48 * 3600),
            dispatch_interval: Duration::from_secs(60),
            send_timeout: Some(Duration::from_secs(30)),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TransportConfig {
    #[default]
    Log,
    Command { command: String, from: String },
}

#[derive(Debug, Clone, Deserialize)]
pub struct SatelliteConfig {
    #[serde(default)]
    pub name: String,
    pub line1: String,
    pub line2: String,
}

impl Config {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let positive = |field: &'static str, d: Duration| {
            if d.is_zero() {
                Err(ConfigError::Invalid {
                    field,
                    message: "must be greater than zero".into(),
                })
            } else {
                Ok(())
            }
        };
        positive("predict.search_window", self.predict.search_window)?;
        positive("trajectory.step", self.trajectory.step)?;
        positive("trajectory.ttl", self.trajectory.ttl)?;
        positive("notifications.dispatch_interval", self.notifications.dispatch_interval)?;
        if !(0.0..=90.0).contains(&self.predict.min_elevation_deg) {
            return Err(ConfigError::Invalid {
                field: "predict.min_elevation_deg",
                message: format!("{} is outside [0, 90]", self.predict.min_elevation_deg),
            });
        }
        self.default_satellite()?;
        Ok(())
    }

    /// Satellite used when a request does not name one.
    pub fn default_satellite(&self) -> Result<Satellite, ConfigError> {
        let satellite = match &self.satellite {
            Some(s) => Satellite::from_tle(&s.name, &s.line1, &s.line2)?,
            None => Satellite::from_tle(DEFAULT_TLE_NAME, DEFAULT_TLE_LINE1, DEFAULT_TLE_LINE2)?,
        };
        Ok(satellite)
    }
}

pub fn parse_duration(s: &str) -> Result<Duration, String> {
    humantime::parse_duration(s.trim()).map_err(|e| e.to_string())
}

fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    parse_duration(&s).map_err(serde::de::Error::custom)
}

fn deserialize_optional_duration<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        None => Ok(None),
        Some(s) if s.trim() == "none" => Ok(None),
        Some(s) => parse_duration(&s).map(Some).map_err(serde::de::Error::custom),
    }
}
