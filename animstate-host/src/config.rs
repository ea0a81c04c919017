//! Host configuration.
//!
//! Configuration is loaded in the following order (later overrides earlier):
//! 1. Default values
//! 2. YAML config file (if specified via ANIMSTATE_CONFIG)
//! 3. Environment variables

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Host configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Which machine and script to run.
    pub machine: MachineConfig,
    /// Simulation loop settings.
    pub simulation: SimulationConfig,
    /// Clip player settings.
    pub player: PlayerConfig,
    /// Logging settings.
    pub log: LogConfig,
}

impl Config {
    /// Loads configuration from file, then applies environment variable overrides.
    pub fn load() -> Result<Self, ConfigError> {
        // Start with defaults
        let mut config = Self::default();

        // Load from file if specified
        if let Ok(path) = std::env::var("ANIMSTATE_CONFIG") {
            config = Self::from_file(&path)?;
        }

        // Apply environment variable overrides
        config.apply_env_overrides();

        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Config = serde_yaml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Ok(config)
    }

    /// Loads configuration from environment variables only.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env_overrides();
        config
    }

    /// Applies environment variable overrides to the configuration.
    fn apply_env_overrides(&mut self) {
        self.machine.apply_env_overrides();
        self.simulation.apply_env_overrides();
        self.player.apply_env_overrides();
        self.log.apply_env_overrides();
    }

    /// Checks value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.simulation.validate()?;
        self.player.validate()
    }

    /// Saves configuration to a YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let content = serde_yaml::to_string(self).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        std::fs::write(path, content).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(())
    }
}

/// Machine and script locations.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MachineConfig {
    /// Machine definition file (YAML or JSON).
    pub definition: Option<PathBuf>,
    /// Tick script to run against the machine.
    pub script: Option<PathBuf>,
}

impl MachineConfig {
    fn apply_env_overrides(&mut self) {
        if let Ok(path) = std::env::var("ANIMSTATE_DEFINITION") {
            self.definition = Some(PathBuf::from(path));
        }
        if let Ok(path) = std::env::var("ANIMSTATE_SCRIPT") {
            self.script = Some(PathBuf::from(path));
        }
    }
}

/// Simulation loop configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Seconds of playback advanced before each tick.
    pub dt_secs: f32,
    /// Upper bound on ticks a single script run may execute (0 = unlimited).
    pub max_ticks: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            dt_secs: 1.0 / 60.0,
            max_ticks: 100_000,
        }
    }
}

impl SimulationConfig {
    fn apply_env_overrides(&mut self) {
        if let Ok(dt) = std::env::var("ANIMSTATE_DT") {
            if let Ok(parsed) = dt.parse() {
                self.dt_secs = parsed;
            }
        }
        if let Ok(max) = std::env::var("ANIMSTATE_MAX_TICKS") {
            if let Ok(n) = max.parse() {
                self.max_ticks = n;
            }
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !(self.dt_secs.is_finite() && self.dt_secs > 0.0) {
            return Err(ConfigError::Validation(format!(
                "simulation.dt_secs must be positive, got {}",
                self.dt_secs
            )));
        }
        Ok(())
    }
}

/// Clip player configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Length in seconds of clips without an explicit entry.
    pub default_clip_secs: f32,
    /// Per-clip lengths in seconds.
    pub clip_secs: BTreeMap<String, f32>,
    /// Clips that wrap around instead of holding their last frame.
    pub looping: Vec<String>,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            default_clip_secs: 1.0,
            clip_secs: BTreeMap::new(),
            looping: Vec::new(),
        }
    }
}

impl PlayerConfig {
    fn apply_env_overrides(&mut self) {
        if let Ok(secs) = std::env::var("ANIMSTATE_DEFAULT_CLIP_SECS") {
            if let Ok(parsed) = secs.parse() {
                self.default_clip_secs = parsed;
            }
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let positive = |v: f32| v.is_finite() && v > 0.0;
        if !positive(self.default_clip_secs) {
            return Err(ConfigError::Validation(format!(
                "player.default_clip_secs must be positive, got {}",
                self.default_clip_secs
            )));
        }
        if let Some((clip, secs)) = self.clip_secs.iter().find(|(_, v)| !positive(**v)) {
            return Err(ConfigError::Validation(format!(
                "player.clip_secs.{} must be positive, got {}",
                clip, secs
            )));
        }
        Ok(())
    }

    /// Length of `clip` in seconds.
    pub fn clip_length(&self, clip: &str) -> f32 {
        self.clip_secs
            .get(clip)
            .copied()
            .unwrap_or(self.default_clip_secs)
    }

    pub fn is_looping(&self, clip: &str) -> bool {
        self.looping.iter().any(|c| c == clip)
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Default filter when RUST_LOG is not set.
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl LogConfig {
    fn apply_env_overrides(&mut self) {
        if let Ok(level) = std::env::var("ANIMSTATE_LOG") {
            if !level.is_empty() {
                self.level = level;
            }
        }
    }
}

/// Configuration error.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{}': {reason}", .path.display())]
    Parse { path: PathBuf, reason: String },

    #[error("configuration validation failed: {0}")]
    Validation(String),
}
