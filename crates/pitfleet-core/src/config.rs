//! Configuration loading and typed config structures for the pitfleet simulation.
//!
//! The canonical configuration lives in `pitfleet-config.yaml` at the project
//! root. This module defines strongly-typed structs that mirror the YAML
//! structure, and provides a loader that reads it. Every field has a default,
//! so an empty file (or no file at all) yields a runnable configuration.

use std::path::{Path, PathBuf};

use pitfleet_fleet::{FleetConfig, FleetConfigError};
use pitfleet_world::{CapacityPolicy, DEFAULT_QUEUE_CAPACITY, Scenario, ScenarioDef, WorldError, create_whaleback};
use serde::Deserialize;
use tracing::info;

/// Environment variable overriding `observer.port`.
pub const OBSERVER_PORT_ENV: &str = "PITFLEET_OBSERVER_PORT";

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read a configuration or scenario file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// The scenario failed validation.
    #[error("invalid scenario: {source}")]
    Scenario {
        /// The underlying validation error.
        #[from]
        source: WorldError,
    },

    /// The `fleet` section holds values vehicles cannot run with.
    #[error("invalid fleet config: {source}")]
    Fleet {
        /// The underlying validation error.
        #[from]
        source: FleetConfigError,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level simulation configuration.
///
/// Mirrors the structure of `pitfleet-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SimulationConfig {
    /// World-level settings (name, seed, timing, fleet size).
    #[serde(default)]
    pub world: WorldConfig,

    /// Vehicle mechanics.
    #[serde(default)]
    pub fleet: FleetConfig,

    /// Admission queue settings.
    #[serde(default)]
    pub queues: QueueConfig,

    /// Speed zone settings.
    #[serde(default)]
    pub zones: ZoneConfig,

    /// Simulation boundary parameters.
    #[serde(default)]
    pub simulation: SimulationBoundsConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// HTTP observer configuration.
    #[serde(default)]
    pub observer: ObserverConfig,

    /// Scenario source.
    #[serde(default)]
    pub scenario: ScenarioConfig,
}

impl SimulationConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// `PITFLEET_OBSERVER_PORT` overrides `observer.port` when set.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Fleet`] if the `fleet` section fails validation.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Load configuration from `path`, falling back to defaults when the
    /// file does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file exists but cannot be read or parsed.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::from_file(path)
        } else {
            info!(path = %path.display(), "Config file not found, using defaults");
            let mut config = Self::default();
            config.observer.apply_env_overrides();
            Ok(config)
        }
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// [`ConfigError::Fleet`] if the `fleet` section fails validation.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yml::from_str(yaml)?
        };
        config.fleet.validate()?;
        config.observer.apply_env_overrides();
        Ok(config)
    }
}

/// World-level configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WorldConfig {
    /// Human-readable run name.
    #[serde(default = "default_world_name")]
    pub name: String,

    /// Random seed for reproducible runs.
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Real-time milliseconds per tick.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Simulated seconds per tick.
    #[serde(default = "default_seconds_per_tick")]
    pub seconds_per_tick: f64,

    /// Number of haul trucks to seed.
    #[serde(default = "default_vehicle_count")]
    pub vehicle_count: u32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            name: default_world_name(),
            seed: default_seed(),
            tick_interval_ms: default_tick_interval_ms(),
            seconds_per_tick: default_seconds_per_tick(),
            vehicle_count: default_vehicle_count(),
        }
    }
}

/// Admission queue configuration, applied to every dig face and dump.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct QueueConfig {
    /// Queue capacity (floored at 1).
    #[serde(default = "default_queue_capacity")]
    pub capacity: u32,

    /// Whether capacity is advisory or enforced.
    #[serde(default)]
    pub policy: CapacityPolicy,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            capacity: default_queue_capacity(),
            policy: CapacityPolicy::default(),
        }
    }
}

/// Speed zone configuration.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct ZoneConfig {
    /// Speed cap outside every zone, in km/h.
    #[serde(default = "default_speed_limit_kph")]
    pub default_speed_limit_kph: f64,
}

impl Default for ZoneConfig {
    fn default() -> Self {
        Self {
            default_speed_limit_kph: default_speed_limit_kph(),
        }
    }
}

/// Simulation boundary configuration.
///
/// A value of 0 for either field means unlimited.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct SimulationBoundsConfig {
    /// Maximum number of ticks before the run ends (0 = unlimited).
    #[serde(default)]
    pub max_ticks: u64,

    /// Maximum wall-clock seconds before the run ends (0 = unlimited).
    #[serde(default)]
    pub max_real_time_seconds: u64,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// HTTP observer configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ObserverConfig {
    /// Whether the observer server is started.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Port the observer listens on.
    #[serde(default = "default_observer_port")]
    pub port: u16,
}

impl ObserverConfig {
    /// Override the port with `PITFLEET_OBSERVER_PORT` when it is set to a
    /// valid port number.
    pub fn apply_env_overrides(&mut self) {
        if let Some(port) = std::env::var(OBSERVER_PORT_ENV)
            .ok()
            .and_then(|val| val.parse::<u16>().ok())
        {
            self.port = port;
        }
    }
}

impl Default for ObserverConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            port: default_observer_port(),
        }
    }
}

/// Where the mine layout comes from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ScenarioConfig {
    /// Path to a scenario YAML file. The built-in Whaleback scenario is used
    /// when absent.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl ScenarioConfig {
    /// Load and validate the configured scenario.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or parsed, or the
    /// scenario fails validation.
    pub fn load(&self) -> Result<Scenario, ConfigError> {
        match &self.path {
            Some(path) => {
                let contents = std::fs::read_to_string(path)?;
                let def: ScenarioDef = serde_yml::from_str(&contents)?;
                info!(path = %path.display(), "Loading scenario file");
                Ok(Scenario::build(def)?)
            }
            None => Ok(create_whaleback()?),
        }
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

fn default_world_name() -> String {
    "Whaleback".to_owned()
}

const fn default_seed() -> u64 {
    42
}

const fn default_tick_interval_ms() -> u64 {
    1000
}

const fn default_seconds_per_tick() -> f64 {
    1.0
}

const fn default_vehicle_count() -> u32 {
    8
}

const fn default_queue_capacity() -> u32 {
    DEFAULT_QUEUE_CAPACITY
}

const fn default_speed_limit_kph() -> f64 {
    40.0
}

fn default_log_level() -> String {
    "info".to_owned()
}

const fn default_observer_port() -> u16 {
    8080
}

const fn default_true() -> bool {
    true
}
