//! Engine configuration
//!
//! Process-wide knobs for the picking and collision subsystems, loadable
//! from TOML. These are intended to be resolved once at startup and handed
//! to the services at construction; changing them mid-session is not
//! supported.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Errors raised while loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration file could not be parsed
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Picking subsystem settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PickingSettings {
    /// Trust bounds-phase results and skip the exact geometry phase
    pub ignore_geometry: bool,

    /// How many result-list buffers the picking service recycles
    pub result_pool_capacity: usize,
}

impl Default for PickingSettings {
    fn default() -> Self {
        Self {
            ignore_geometry: false,
            result_pool_capacity: 32,
        }
    }
}

/// Collision subsystem settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CollisionSettings {
    /// Whether the engine's own per-tick check evaluation runs
    pub update_enabled: bool,
}

impl Default for CollisionSettings {
    fn default() -> Self {
        Self {
            update_enabled: true,
        }
    }
}

/// Top-level engine settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Picking subsystem settings
    pub picking: PickingSettings,

    /// Collision subsystem settings
    pub collision: CollisionSettings,
}

impl EngineSettings {
    /// Load settings from a TOML file
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parse settings from a TOML string
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }
}
