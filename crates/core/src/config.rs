//! Configuration management
//!
//! This module handles loading and version-checking the tarp configuration file.
//! tarp never writes the file; users edit it by hand.
//! The configuration file is stored in TOML format at ~/.config/tarp/config.toml,
//! or in `$TARP_CONFIG_DIR/config.toml` when that variable is set.
//!
//! PROTECTED FILE: Changes to schema_version require migration support.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::process::Shell;

/// Current configuration schema version
pub const SCHEMA_VERSION: u32 = 1;

/// Environment variable overriding the configuration directory
pub const CONFIG_DIR_ENV: &str = "TARP_CONFIG_DIR";

/// Default records per shard
const DEFAULT_COUNT: usize = 1_000_000;

/// Default bytes per shard
const DEFAULT_SIZE: u64 = 1_000_000_000;

/// Default shard name pattern
const DEFAULT_PATTERN: &str = "split-%06d.tar";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Schema version for migration support
    pub schema_version: u32,

    /// Interpreter for `pipe:` descriptors
    #[serde(default)]
    pub shell: Shell,

    /// Defaults for the split command
    #[serde(default)]
    pub split: SplitDefaults,
}

/// Default settings for `tarp split`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitDefaults {
    /// Maximum records per shard
    #[serde(default = "default_count")]
    pub count: usize,

    /// Maximum bytes per shard
    #[serde(default = "default_size")]
    pub size: u64,

    /// Output pattern
    #[serde(default = "default_pattern")]
    pub pattern: String,

    /// Index of the first shard
    #[serde(default)]
    pub start_index: usize,
}

fn default_count() -> usize {
    DEFAULT_COUNT
}

fn default_size() -> u64 {
    DEFAULT_SIZE
}

fn default_pattern() -> String {
    DEFAULT_PATTERN.to_string()
}

impl Default for SplitDefaults {
    fn default() -> Self {
        Self {
            count: default_count(),
            size: default_size(),
            pattern: default_pattern(),
            start_index: 0,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            shell: Shell::default(),
            split: SplitDefaults::default(),
        }
    }
}

/// Configuration manager handles loading and saving config
#[derive(Debug)]
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Create a new ConfigManager with the default config path
    pub fn new() -> Result<Self> {
        let config_dir = match std::env::var_os(CONFIG_DIR_ENV) {
            Some(dir) => PathBuf::from(dir),
            None => dirs::config_dir()
                .ok_or_else(|| Error::Config("Could not determine config directory".into()))?
                .join("tarp"),
        };
        Ok(Self {
            config_path: config_dir.join("config.toml"),
        })
    }

    /// Create a ConfigManager with a custom path (useful for testing)
    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    /// Get the configuration file path
    pub fn config_path(&self) -> &PathBuf {
        &self.config_path
    }

    /// Load configuration from disk
    ///
    /// If the configuration file doesn't exist, returns a default configuration.
    /// Files from a newer tarp are rejected.
    pub fn load(&self) -> Result<Config> {
        if !self.config_path.exists() {
            return Ok(Config::default());
        }

        let content = std::fs::read_to_string(&self.config_path)?;
        let mut config: Config = toml::from_str(&content)?;

        if config.schema_version < SCHEMA_VERSION {
            // Fields added since then have serde defaults.
            config.schema_version = SCHEMA_VERSION;
        } else if config.schema_version > SCHEMA_VERSION {
            return Err(Error::Config(format!(
                "Configuration file version {} is newer than supported version {}. Please upgrade tarp.",
                config.schema_version, SCHEMA_VERSION
            )));
        }

        Ok(config)
    }
}
