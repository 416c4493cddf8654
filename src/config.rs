use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

const DEFAULT_INTERVAL_SECS: f64 = 1.0;
const DEFAULT_SAMPLES: u32 = 30;
const DEFAULT_TIMEOUT_SECS: f64 = 2.0;
const DEFAULT_PACKET_SIZE: usize = 56;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("target hosts parameter is required")]
    MissingTargets,

    #[error("target #{index} is blank")]
    BlankTarget { index: usize },

    #[error("{field} must be greater than zero")]
    NonPositive { field: &'static str },

    #[error("{field} is too large to be a duration")]
    OutOfRange { field: &'static str },

    #[error("could not find config directory")]
    NoConfigDir,

    #[error("failed to read config file: {0}")]
    Read(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Parameters of one heatmap run. Time values are in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HeatmapConfig {
    pub targets: Vec<String>,
    pub interval: f64,
    pub samples: u32,
    pub timeout: f64,
    pub packet_size: usize,
    pub show_graph: bool,
}

impl Default for HeatmapConfig {
    fn default() -> Self {
        Self {
            targets: Vec::new(),
            interval: DEFAULT_INTERVAL_SECS,
            samples: DEFAULT_SAMPLES,
            timeout: DEFAULT_TIMEOUT_SECS,
            packet_size: DEFAULT_PACKET_SIZE,
            show_graph: true,
        }
    }
}

impl HeatmapConfig {
    pub fn new<I, S>(targets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            targets: targets.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn get_config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir()
            .ok_or(ConfigError::NoConfigDir)?
            .join("LatencyHeatmap");

        Ok(config_dir.join("config.json"))
    }

    /// Reads defaults from the user's config file, falling back to the
    /// built-in values when the file is missing or unusable.
    pub fn load() -> Self {
        match Self::get_config_path() {
            Ok(path) if path.exists() => match Self::load_from(&path) {
                Ok(config) => config,
                Err(e) => {
                    warn!("Ignoring config file {}: {}", path.display(), e);
                    Self::default()
                }
            },
            Ok(_) => Self::default(),
            Err(e) => {
                warn!("Failed to get config path: {}", e);
                Self::default()
            }
        }
    }

    pub fn load_from(path: &std::path::Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Builds a config from a loosely typed parameter map.
    ///
    /// `targets` is a required comma separated string. Numeric parameters
    /// replace the defaults only when they are numbers greater than zero.
    pub fn from_params(params: &Map<String, Value>) -> Result<Self, ConfigError> {
        let targets = params
            .get("targets")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::MissingTargets)?;

        let mut config = Self::new(targets.split(',').map(str::trim));
        if let Some(interval) = positive_number(params, "interval") {
            config.interval = interval;
        }
        if let Some(samples) = positive_number(params, "samples") {
            config.samples = (samples as u32).max(1);
        }
        if let Some(timeout) = positive_number(params, "timeout") {
            config.timeout = timeout;
        }
        if let Some(packet_size) = positive_number(params, "packetSize") {
            config.packet_size = (packet_size as usize).max(1);
        }
        if let Some(show_graph) = params.get("showGraph").and_then(Value::as_bool) {
            config.show_graph = show_graph;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.targets.is_empty() {
            return Err(ConfigError::MissingTargets);
        }
        if let Some(index) = self.targets.iter().position(|t| t.trim().is_empty()) {
            return Err(ConfigError::BlankTarget { index });
        }
        self.interval_duration()?;
        if self.samples == 0 {
            return Err(ConfigError::NonPositive { field: "samples" });
        }
        self.timeout_duration()?;
        if self.packet_size == 0 {
            return Err(ConfigError::NonPositive { field: "packetSize" });
        }
        Ok(())
    }

    pub fn interval_duration(&self) -> Result<Duration, ConfigError> {
        positive_duration("interval", self.interval)
    }

    pub fn timeout_duration(&self) -> Result<Duration, ConfigError> {
        positive_duration("timeout", self.timeout)
    }
}

/// Converts a positive number of seconds, rejecting zero, negatives, NaN
/// and values no `Duration` can hold.
pub fn positive_duration(field: &'static str, secs: f64) -> Result<Duration, ConfigError> {
    if !(secs > 0.0) {
        return Err(ConfigError::NonPositive { field });
    }
    Duration::try_from_secs_f64(secs).map_err(|_| ConfigError::OutOfRange { field })
}

fn positive_number(params: &Map<String, Value>, key: &str) -> Option<f64> {
    params
        .get(key)
        .and_then(Value::as_f64)
        .filter(|v| *v > 0.0 && v.is_finite())
}
