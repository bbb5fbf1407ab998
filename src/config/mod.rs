//! Configuration loading and model resolution

mod io;
mod model;
mod run;
mod settings;

pub use model::{ModelConfig, merge_maps};
pub use run::{DEFAULT_API_BASE, DEFAULT_MODEL, DEFAULT_TIMEOUT_SECS, RunConfig, RunOverrides};
pub use settings::SessionSettings;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Error type for configuration loading and resolution
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Circular dependency detected for model: {0}")]
    CircularExtend(String),
}

/// Contents of `~/.llmterm/config.yaml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    /// Model key used when none is given on the command line
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub default: String,

    /// Global request timeout in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,

    /// Named model entries
    #[serde(default)]
    pub models: HashMap<String, ModelConfig>,

    /// Interactive session settings
    #[serde(default)]
    pub session: SessionSettings,
}

impl ConfigFile {
    /// Parse config text and expand model aliases.
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        // An empty file is a valid, empty config
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let mut config: ConfigFile = serde_yaml::from_str(content)?;
        config.expand_aliases();
        Ok(config)
    }
}
