//! Optional TOML configuration.
//!
//! Every field has a default, so a missing file or an empty table behaves
//! exactly like the built-in settings.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Host identity file
    pub os_release_path: PathBuf,
    /// Directory whose mtime marks the last apt index refresh
    pub apt_cache_dir: PathBuf,
    /// Minimum age of the apt index before it is refreshed again
    pub refresh_interval_secs: u64,
    /// Environment variable signalling a CI run
    pub ci_env_var: String,
    /// Single character used for step separators
    pub progress_separator: String,
    /// Suppress debconf prompts during apt-get installs
    pub debian_noninteractive: bool,
    /// Categories to assume for an id whose os-release has no ID_LIKE
    pub category_fallbacks: BTreeMap<String, String>,
}

impl Config {
    pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 24 * 60 * 60;
}

impl Default for Config {
    fn default() -> Self {
        Self {
            os_release_path: PathBuf::from("/etc/os-release"),
            apt_cache_dir: PathBuf::from("/var/cache/apt"),
            refresh_interval_secs: Self::DEFAULT_REFRESH_INTERVAL_SECS,
            ci_env_var: "CI".to_string(),
            progress_separator: "━".to_string(),
            debian_noninteractive: true,
            category_fallbacks: BTreeMap::new(),
        }
    }
}

/// Default location: `$XDG_CONFIG_HOME/distpkg/config.toml`.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("distpkg").join("config.toml"))
}

impl Config {
    /// Load from an explicit path, which must exist.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        Self::from_toml(&content).with_context(|| format!("loading config file {}", path.display()))
    }

    /// Load from the default location, falling back to defaults when absent.
    pub fn load() -> Result<Self> {
        match default_config_path() {
            Some(path) if path.exists() => Self::load_from_path(path),
            _ => Ok(Self::default()),
        }
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).context("parsing config")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.refresh_interval_secs == 0 {
            anyhow::bail!("refresh_interval_secs must be greater than zero");
        }
        if self.ci_env_var.trim().is_empty() {
            anyhow::bail!("ci_env_var must not be empty");
        }
        Ok(())
    }

    /// Whether the configured CI variable is set to a non-empty value.
    pub fn is_ci(&self, lookup: impl Fn(&str) -> Option<String>) -> bool {
        lookup(&self.ci_env_var).is_some_and(|value| !value.is_empty())
    }
}
