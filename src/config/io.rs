//! Configuration file I/O operations

use std::path::{Path, PathBuf};

use super::{ConfigError, ConfigFile};

impl ConfigFile {
    /// Get the config directory path (~/.llmterm/)
    pub fn config_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".llmterm")
    }

    /// Get the config file path (~/.llmterm/config.yaml)
    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.yaml")
    }

    /// Pre-directory config location (~/.llmterm.yaml)
    pub fn legacy_config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".llmterm.yaml")
    }

    /// Path of the interception history log
    pub fn history_path() -> PathBuf {
        Self::config_dir().join("history.jsonl")
    }

    /// Path of the session log file
    pub fn log_path() -> PathBuf {
        Self::config_dir().join("llmterm.log")
    }

    /// Load configuration from a file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        Self::from_yaml(&content).map_err(|e| match e {
            ConfigError::Yaml(source) => ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })
    }

    /// Load configuration.
    ///
    /// An explicit path must exist. Otherwise `~/.llmterm/config.yaml` is
    /// used, then the legacy `~/.llmterm.yaml`, then built-in defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        Self::load_from(&Self::config_path(), &Self::legacy_config_path())
    }

    pub(super) fn load_from(primary: &Path, legacy: &Path) -> Result<Self, ConfigError> {
        if primary.exists() {
            return Self::from_file(primary);
        }

        if legacy.exists() {
            eprintln!(
                "Note: using legacy config {}; move it to {}",
                legacy.display(),
                primary.display()
            );
            return Self::from_file(legacy);
        }

        tracing::debug!("No config file found, using defaults");
        Ok(Self::default())
    }
}
