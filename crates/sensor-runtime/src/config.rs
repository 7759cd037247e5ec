//! Sensor configuration
//!
//! Loaded once at startup: TOML file, then `PC_*` environment overrides,
//! then validation. Any error here is fatal.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use pc_03_registration_api::RegistrationConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Environment variable naming the config file
pub const CONFIG_PATH_VAR: &str = "PC_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "./sensor.toml";

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {reason}")]
    Io { path: String, reason: String },

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Invalid value {value:?} for {key}")]
    Override { key: String, value: String },

    #[error("Invalid config: {0}")]
    Invalid(String),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Monitor-mode interface the capture helper listens on
    pub interface: String,
    /// `-` for stdin, otherwise a path to a file or FIFO of JSON lines
    pub feed: String,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            interface: "wlan0mon".to_string(),
            feed: "-".to_string(),
        }
    }
}

impl CaptureConfig {
    pub fn reads_stdin(&self) -> bool {
        self.feed == "-"
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Expected distinct devices per epoch
    pub capacity: usize,
    pub false_positive_rate: f64,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            capacity: 1000,
            false_positive_rate: 0.01,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EpochConfig {
    pub interval_secs: u64,
    /// Closed epochs allowed to wait for the reporting worker
    pub report_queue_depth: usize,
}

impl Default for EpochConfig {
    fn default() -> Self {
        Self {
            interval_secs: 300,
            report_queue_depth: 4,
        }
    }
}

impl EpochConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointsConfig {
    pub encryption_service_url: String,
    pub server_url: String,
    pub request_timeout_secs: u64,
}

impl Default for EndpointsConfig {
    fn default() -> Self {
        Self {
            encryption_service_url: "http://localhost:3000/encrypt".to_string(),
            server_url: "http://localhost:4000/epoch".to_string(),
            request_timeout_secs: 30,
        }
    }
}

impl EndpointsConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Complete sensor configuration
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorConfig {
    pub sensor_id: String,
    pub capture: CaptureConfig,
    pub filter: FilterConfig,
    pub epoch: EpochConfig,
    pub registration: RegistrationConfig,
    pub endpoints: EndpointsConfig,
}

impl SensorConfig {
    /// Read, override from the process environment, and validate
    ///
    /// # Errors
    /// Any `ConfigError`; a missing file is an error, not a fallback.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        let mut config = Self::parse(&content)?;
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Parse TOML without overrides or validation
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Apply `PC_*` overrides, looking each key up through `lookup`
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("PC_SENSOR_ID") {
            self.sensor_id = v;
        }
        if let Some(v) = lookup("PC_INTERFACE") {
            self.capture.interface = v;
        }
        if let Some(v) = lookup("PC_CAPTURE_FEED") {
            self.capture.feed = v;
        }
        if let Some(v) = lookup("PC_FILTER_CAPACITY") {
            self.filter.capacity = parse_override("PC_FILTER_CAPACITY", &v)?;
        }
        if let Some(v) = lookup("PC_FALSE_POSITIVE_RATE") {
            self.filter.false_positive_rate = parse_override("PC_FALSE_POSITIVE_RATE", &v)?;
        }
        if let Some(v) = lookup("PC_EPOCH_INTERVAL_SECS") {
            self.epoch.interval_secs = parse_override("PC_EPOCH_INTERVAL_SECS", &v)?;
        }
        if let Some(v) = lookup("PC_HOST") {
            self.registration.host = v;
        }
        if let Some(v) = lookup("PC_PORT") {
            self.registration.port = parse_override("PC_PORT", &v)?;
        }
        if let Some(v) = lookup("PC_ENCRYPTION_URL") {
            self.endpoints.encryption_service_url = v;
        }
        if let Some(v) = lookup("PC_SERVER_URL") {
            self.endpoints.server_url = v;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sensor_id.trim().is_empty() {
            return Err(ConfigError::Invalid("sensor_id must not be empty".into()));
        }
        if self.capture.feed.is_empty() {
            return Err(ConfigError::Invalid("capture.feed must not be empty".into()));
        }
        if self.filter.capacity == 0 {
            return Err(ConfigError::Invalid("filter.capacity must be positive".into()));
        }
        let p = self.filter.false_positive_rate;
        if !(p > 0.0 && p < 1.0) {
            return Err(ConfigError::Invalid(format!(
                "filter.false_positive_rate must be in (0, 1), got {p}"
            )));
        }
        if self.epoch.interval_secs == 0 {
            return Err(ConfigError::Invalid("epoch.interval_secs must be positive".into()));
        }
        if self.epoch.report_queue_depth == 0 {
            return Err(ConfigError::Invalid(
                "epoch.report_queue_depth must be positive".into(),
            ));
        }
        self.registration
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        if self.endpoints.encryption_service_url.is_empty() {
            return Err(ConfigError::Invalid(
                "endpoints.encryption_service_url must not be empty".into(),
            ));
        }
        if self.endpoints.server_url.is_empty() {
            return Err(ConfigError::Invalid("endpoints.server_url must not be empty".into()));
        }
        if self.endpoints.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "endpoints.request_timeout_secs must be positive".into(),
            ));
        }
        Ok(())
    }
}

/// Config path: first CLI argument, then `PC_CONFIG`, then the default
pub fn config_path(arg: Option<String>, env: Option<String>) -> PathBuf {
    arg.or(env)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string())
        .into()
}

fn parse_override<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Override {
        key: key.to_string(),
        value: value.to_string(),
    })
}
