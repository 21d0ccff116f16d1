//! Game configuration with documented defaults
//!
//! Loaded from TOML (`data/config.toml` by default). Every section is
//! optional; missing keys fall back to the values below.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::battle::constants::{DEFAULT_FRAMES_PER_TURN, DEFAULT_FRAME_INTERVAL_MS};
use crate::battle::units::UnitStats;
use crate::core::error::{Result, TacticsError};

/// Turn engine settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Number of simulation frames a turn is resolved into
    ///
    /// Resolution cost grows as frames × units², and playback length
    /// is frames × frame_interval. At 500 frames and 16 ms a turn plays
    /// for roughly eight seconds.
    pub frames_per_turn: usize,

    /// Delay between two rendered frames during playback (milliseconds)
    pub frame_interval_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            frames_per_turn: DEFAULT_FRAMES_PER_TURN,
            frame_interval_ms: DEFAULT_FRAME_INTERVAL_MS,
        }
    }
}

impl EngineConfig {
    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        if self.frames_per_turn == 0 {
            return Err(TacticsError::InvalidConfig(
                "frames_per_turn must be at least 1".into(),
            ));
        }
        if self.frame_interval_ms == 0 {
            return Err(TacticsError::InvalidConfig(
                "frame_interval_ms must be positive".into(),
            ));
        }
        Ok(())
    }
}

/// Complete game configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GameConfig {
    #[serde(default)]
    pub engine: EngineConfig,
    /// Tuning for the Looper unit type
    #[serde(default)]
    pub looper: UnitStats,
}

impl GameConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and validate a TOML document
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: GameConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config = Self::from_toml_str(&contents)?;
        tracing::debug!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Load `path` if given, otherwise `data/config.toml` when present,
    /// otherwise defaults
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => {
                let default_path = default_config_path();
                if default_path.exists() {
                    Self::load(&default_path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.engine.validate()?;
        self.looper.validate()
    }
}

fn default_config_path() -> PathBuf {
    PathBuf::from("data").join("config.toml")
}
