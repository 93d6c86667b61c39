//! Configuration file support for the pollen annotator.
//!
//! Settings are read from a JSON file, by default
//! `<config dir>/pollen-annotator/config.json`. Every field is optional;
//! missing fields take the built-in defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::constants::{BACKUP_DIRECTORY, BACKUP_INTERVAL, STATE_FILE_NAME};
use crate::grid::GridConfig;
use crate::model::default_vocabulary;

/// Logging verbosity, from quietest to loudest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    const ORDERED: [LogLevel; 5] = [
        LogLevel::Error,
        LogLevel::Warn,
        LogLevel::Info,
        LogLevel::Debug,
        LogLevel::Trace,
    ];

    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }

    /// `steps` levels louder, saturating at trace. Used for repeated `-v`.
    pub fn raised(self, steps: u8) -> Self {
        let current = self as usize;
        Self::ORDERED[(current + usize::from(steps)).min(Self::ORDERED.len() - 1)]
    }
}

/// Format version written to new files. Files with a higher version are rejected.
pub const CONFIG_VERSION: u32 = 1;

/// Annotator configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotatorConfig {
    #[serde(default = "default_version")]
    pub version: u32,

    /// Crop geometry and naming
    #[serde(flatten)]
    pub grid: GridConfig,

    /// Session file name inside the processing root
    #[serde(default = "default_state_file_name")]
    pub state_file_name: String,

    /// Backup subdirectory of the processing root
    #[serde(default = "default_backup_directory")]
    pub backup_directory: String,

    /// Every n-th save also writes a backup (0 disables)
    #[serde(default = "default_backup_interval")]
    pub backup_interval: u64,

    /// Labels accepted for manual boxes
    #[serde(default = "default_vocabulary")]
    pub vocabulary: Vec<String>,

    #[serde(default)]
    pub log_level: LogLevel,
}

fn default_version() -> u32 {
    CONFIG_VERSION
}

fn default_state_file_name() -> String {
    STATE_FILE_NAME.to_string()
}

fn default_backup_directory() -> String {
    BACKUP_DIRECTORY.to_string()
}

fn default_backup_interval() -> u64 {
    BACKUP_INTERVAL
}

impl AnnotatorConfig {
    pub fn new() -> Self {
        Self {
            version: CONFIG_VERSION,
            grid: GridConfig::default(),
            state_file_name: default_state_file_name(),
            backup_directory: default_backup_directory(),
            backup_interval: default_backup_interval(),
            vocabulary: default_vocabulary(),
            log_level: LogLevel::default(),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Parse a configuration, rejecting files from a newer release.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        match config.version {
            version if version > CONFIG_VERSION => Err(ConfigError::VersionTooNew {
                file_version: version,
                supported_version: CONFIG_VERSION,
            }),
            _ => Ok(config),
        }
    }

    /// Whether `label` may be used for a manual box.
    pub fn is_known_label(&self, label: &str) -> bool {
        self.vocabulary.iter().any(|l| l == label)
    }

    pub fn default_filename() -> &'static str {
        "config.json"
    }

    /// `<config dir>/pollen-annotator/config.json`, or under `~/.config`
    /// when the platform has no config directory.
    pub fn default_path() -> Option<PathBuf> {
        let base = dirs::config_dir().or_else(|| dirs::home_dir().map(|home| home.join(".config")))?;
        Some(base.join("pollen-annotator").join(Self::default_filename()))
    }

    /// Read a configuration file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json(&json)?;
        log::info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Load an explicitly given file, or the default file if it exists.
    ///
    /// An explicit path must be readable. A missing default file yields the
    /// defaults; an unreadable one is reported and also yields the defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = path {
            return Self::load(path);
        }

        let Some(path) = Self::default_path() else {
            return Ok(Self::new());
        };
        if !path.exists() {
            log::debug!("No config file found at {:?}", path);
            return Ok(Self::new());
        }

        match Self::load(&path) {
            Ok(config) => Ok(config),
            Err(e) => {
                log::warn!("Ignoring config file {:?}: {}", path, e);
                Ok(Self::new())
            }
        }
    }

    /// Write the configuration, creating parent directories if needed.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = self.to_json()?;
        std::fs::write(path, json)?;
        log::info!("Saved configuration to {:?}", path);
        Ok(())
    }
}

impl Default for AnnotatorConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Configuration version {file_version} needs a newer annotator (this one reads up to {supported_version})")]
    VersionTooNew {
        file_version: u32,
        supported_version: u32,
    },

    #[error("Cannot access configuration file: {0}")]
    Io(#[from] std::io::Error),
}
