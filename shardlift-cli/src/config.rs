///! CLI configuration management
///!
///! Every key is optional; command-line flags win over the file.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use shardlift_common::{Error, PollPolicy};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub cluster_url: Option<String>,
    pub group: Option<String>,
    pub region: Option<String>,
    pub output: Option<String>,
    pub log_level: Option<String>,
    pub log_dir: Option<PathBuf>,
    pub log_rotation: Option<String>,
    pub http_timeout_secs: Option<u64>,
    pub add_poll: Option<PollPolicy>,
    pub remove_poll: Option<PollPolicy>,
}

impl Config {
    /// Load `path`, or the default location when no path is given
    ///
    /// A missing file at the default location yields the default config; a
    /// missing file that was asked for explicitly is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (path, explicit) = match path {
            Some(path) => (path.to_path_buf(), true),
            None => match Self::config_path() {
                Some(path) => (path, false),
                None => return Ok(Self::default()),
            },
        };

        if !explicit && !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;

        Self::from_toml(&contents)
            .with_context(|| format!("failed to parse config file {}", path.display()))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), Error> {
        if self.http_timeout_secs == Some(0) {
            return Err(Error::Config("http_timeout_secs must be greater than 0".to_string()));
        }
        for (key, poll) in [("add_poll", &self.add_poll), ("remove_poll", &self.remove_poll)] {
            if matches!(poll, Some(p) if p.max_attempts == 0) {
                return Err(Error::Config(format!("{}.max_attempts must be greater than 0", key)));
            }
        }
        Ok(())
    }

    /// `~/.config/shardlift/config.toml`
    pub fn config_path() -> Option<PathBuf> {
        let home = std::env::var_os("HOME")?;
        Some(PathBuf::from(home).join(".config/shardlift/config.toml"))
    }

    pub fn http_timeout(&self) -> Duration {
        self.http_timeout_secs
            .map(Duration::from_secs)
            .unwrap_or(shardlift_core::cluster::DEFAULT_HTTP_TIMEOUT)
    }

    pub fn add_poll(&self) -> PollPolicy {
        self.add_poll.unwrap_or_else(PollPolicy::add_default)
    }

    pub fn remove_poll(&self) -> PollPolicy {
        self.remove_poll.unwrap_or_else(PollPolicy::remove_default)
    }
}

/// Flag value, else config value, else a configuration error naming both
pub fn require(flag: Option<String>, configured: &Option<String>, what: &str, hint: &str) -> Result<String> {
    flag.or_else(|| configured.clone())
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| Error::Config(format!("{} is required ({})", what, hint)).into())
}
