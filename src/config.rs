//! Configuration loading and data directory resolution.
//!
//! The data directory is chosen in priority order:
//! 1. `--data-dir` command-line argument
//! 2. `RTM_DATA_DIR` environment variable (clap reads it into the same argument)
//! 3. `$HOME/.rtm`
//!
//! An optional `config.toml` inside the data directory tunes classifier and
//! task defaults.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::classifier::{ClassifierOptions, DEFAULT_TITLE_MAX_LEN};
use crate::error::{Error, Result};
use crate::task::DEFAULT_ESTIMATE_HOURS;

pub const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub title_max_len: usize,
    pub default_estimate_hours: f64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            title_max_len: DEFAULT_TITLE_MAX_LEN,
            default_estimate_hours: DEFAULT_ESTIMATE_HOURS,
        }
    }
}

impl Config {
    /// Load `config.toml` from `data_dir`; a missing file yields defaults.
    pub fn load(data_dir: &Path) -> Result<Self> {
        let path = data_dir.join(CONFIG_FILE);
        if !path.exists() {
            return Ok(Config::default());
        }
        let text = fs::read_to_string(&path)?;
        let config: Config = toml::from_str(&text)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))?;
        config.validate()?;
        debug!(path = %path.display(), ?config, "configuration loaded");
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.title_max_len < 8 {
            return Err(Error::Config(format!("title_max_len must be at least 8, got {}", self.title_max_len)));
        }
        if !self.default_estimate_hours.is_finite() || self.default_estimate_hours < 0.0 {
            return Err(Error::Config(format!(
                "default_estimate_hours must be a non-negative number, got {}",
                self.default_estimate_hours
            )));
        }
        Ok(())
    }

    pub fn classifier_options(&self) -> ClassifierOptions {
        ClassifierOptions {
            title_max_len: self.title_max_len,
            default_estimate_hours: self.default_estimate_hours,
        }
    }
}

/// Pick the data directory from an explicit argument or the home directory.
pub fn resolve_data_dir(cli_arg: Option<&Path>) -> PathBuf {
    if let Some(dir) = cli_arg {
        return dir.to_path_buf();
    }
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(".rtm")
}
