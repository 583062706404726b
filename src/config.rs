//! Runtime tuning loaded from `config.toml`
//!
//! Every field has a default, so a missing file or a partial file is fine. The
//! file is only ever read. Key bindings are fixed and not part of it.

use crate::mapping::{DirectionMode, EngineSettings, RepeatTiming};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Overrides the config file location
pub const CONFIG_ENV: &str = "PADKEYS_CONFIG";

/// Allowed tick period, roughly 60 to 100 Hz
pub const POLL_INTERVAL_RANGE_MS: std::ops::RangeInclusive<u64> = 10..=16;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct MapperConfig {
    pub poll_interval_ms: u64,
    pub analog_deadzone: i16,
    pub trigger_threshold: i16,
    pub direction_mode: DirectionMode,
    pub repeat: RepeatConfig,
    /// Log key transitions instead of injecting them
    pub dry_run: bool,
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct RepeatConfig {
    pub initial_delay_ms: u64,
    pub interval_ms: u64,
}

impl Default for MapperConfig {
    fn default() -> Self {
        let engine = EngineSettings::default();
        Self {
            poll_interval_ms: 16,
            analog_deadzone: engine.analog_deadzone,
            trigger_threshold: engine.trigger_threshold,
            direction_mode: engine.direction_mode,
            repeat: RepeatConfig::default(),
            dry_run: false,
        }
    }
}

impl Default for RepeatConfig {
    fn default() -> Self {
        let timing = RepeatTiming::default();
        Self {
            initial_delay_ms: timing.initial_delay.as_millis() as u64,
            interval_ms: timing.interval.as_millis() as u64,
        }
    }
}

impl MapperConfig {
    /// `$PADKEYS_CONFIG`, else `<config dir>/padkeys/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        if let Some(path) = std::env::var_os(CONFIG_ENV) {
            return Some(PathBuf::from(path));
        }
        dirs::config_dir().map(|dir| dir.join("padkeys").join("config.toml"))
    }

    /// Loads from the default location, falling back to defaults if no file exists
    pub fn load() -> Result<Self, ConfigError> {
        match Self::default_path() {
            Some(path) => Self::load_from(&path),
            None => {
                debug!("No config directory available, using defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            info!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::parse(&content).map_err(|e| match e {
            ConfigError::Parse { source, .. } => ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })?;

        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: PathBuf::new(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !POLL_INTERVAL_RANGE_MS.contains(&self.poll_interval_ms) {
            return Err(ConfigError::Invalid(format!(
                "poll_interval_ms {} must be within {}..={}",
                self.poll_interval_ms,
                POLL_INTERVAL_RANGE_MS.start(),
                POLL_INTERVAL_RANGE_MS.end()
            )));
        }
        self.engine_settings()
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            analog_deadzone: self.analog_deadzone,
            trigger_threshold: self.trigger_threshold,
            direction_mode: self.direction_mode,
            repeat: RepeatTiming {
                initial_delay: Duration::from_millis(self.repeat.initial_delay_ms),
                interval: Duration::from_millis(self.repeat.interval_ms),
            },
        }
    }
}
