use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{FlowError, Result};

/// Runtime configuration for branchflow.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Config {
    /// Remote every fetch/push/pull talks to.
    #[serde(default = "default_remote")]
    pub remote: String,

    /// How many branches per kind `list` shows when no count is given.
    #[serde(default = "default_list_count")]
    pub list_count: usize,
}

fn default_remote() -> String {
    "origin".to_string()
}

fn default_list_count() -> usize {
    2
}

impl Default for Config {
    fn default() -> Self {
        Config {
            remote: default_remote(),
            list_count: default_list_count(),
        }
    }
}

/// Loads configuration from file or returns defaults.
///
/// Attempts to load configuration in the following order:
/// 1. Custom path provided as parameter
/// 2. `branchflow.toml` in current directory
/// 3. `.branchflow.toml` in the user config directory
/// 4. Default configuration if no file found
pub fn load_config(config_path: Option<&str>) -> Result<Config> {
    let config_str = if let Some(path) = config_path {
        fs::read_to_string(path)?
    } else if Path::new("./branchflow.toml").exists() {
        fs::read_to_string("./branchflow.toml")?
    } else if let Some(config_dir) = dirs::config_dir() {
        let config_path = config_dir.join(".branchflow.toml");
        if config_path.exists() {
            fs::read_to_string(config_path)?
        } else {
            return Ok(Config::default());
        }
    } else {
        return Ok(Config::default());
    };

    toml::from_str(&config_str)
        .map_err(|e| FlowError::config(format!("invalid configuration file: {}", e)))
}
