// Client configuration
//
// Read from ~/.model-advisor/config.toml; every field is optional.

pub mod merger;

pub use merger::{load_config, ConfigMerger};

use crate::file_storage::get_state_dir;
use anyhow::{anyhow, bail, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://localhost:5000";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_SHUTDOWN_GRACE_MS: u64 = 250;

const CONFIG_FILE: &str = "config.toml";

/// Fully resolved configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdvisorConfig {
    /// Root URL of the assistant service
    pub base_url: String,
    pub request_timeout_secs: u64,
    /// Where the session file lives
    pub state_dir: PathBuf,
    /// How long shutdown waits for a detached session-end notice
    pub shutdown_grace_ms: u64,
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            state_dir: get_state_dir(),
            shutdown_grace_ms: DEFAULT_SHUTDOWN_GRACE_MS,
        }
    }
}

impl AdvisorConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }

    /// Reject values the client cannot run with
    pub fn validate(&self) -> Result<()> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            bail!("base_url must start with http:// or https://, got '{}'", self.base_url);
        }
        if self.request_timeout_secs == 0 {
            bail!("request_timeout_secs must be greater than zero");
        }
        Ok(())
    }
}

/// One configuration layer; `None` fields fall through to the layer below
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PartialAdvisorConfig {
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
    #[serde(default)]
    pub state_dir: Option<PathBuf>,
    #[serde(default)]
    pub shutdown_grace_ms: Option<u64>,
}

impl PartialAdvisorConfig {
    /// Default config file path (~/.model-advisor/config.toml)
    pub fn default_path() -> PathBuf {
        get_state_dir().join(CONFIG_FILE)
    }

    /// Load a config file; a missing file yields `None`
    pub fn load_file(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }

        let contents = fs::read_to_string(path)
            .map_err(|e| anyhow!("Failed to read config file '{}': {}", path.display(), e))?;

        let config: PartialAdvisorConfig = toml::from_str(&contents)
            .map_err(|e| anyhow!("Failed to parse config file '{}': {}", path.display(), e))?;

        Ok(Some(config))
    }
}
