// Configuration merging with priority

use super::{AdvisorConfig, PartialAdvisorConfig};
use anyhow::Result;
use std::path::Path;

/// Configuration merger
/// Priority order: CLI/env -> config file -> defaults
pub struct ConfigMerger {
    defaults: AdvisorConfig,
    file: Option<PartialAdvisorConfig>,
    cli: Option<PartialAdvisorConfig>,
}

impl ConfigMerger {
    /// Create a new config merger with defaults
    pub fn new() -> Self {
        Self {
            defaults: AdvisorConfig::default(),
            file: None,
            cli: None,
        }
    }

    /// Set the config file layer
    pub fn with_file(mut self, config: Option<PartialAdvisorConfig>) -> Self {
        self.file = config;
        self
    }

    /// Set CLI overrides. Environment variables arrive through clap and share this layer.
    pub fn with_cli(mut self, config: Option<PartialAdvisorConfig>) -> Self {
        self.cli = config;
        self
    }

    /// Merge all layers with priority
    pub fn merge(&self) -> AdvisorConfig {
        let mut result = self.defaults.clone();

        if let Some(ref file) = self.file {
            result = self.merge_partial(&result, file);
        }

        // Highest priority
        if let Some(ref cli) = self.cli {
            result = self.merge_partial(&result, cli);
        }

        result
    }

    fn merge_partial(&self, base: &AdvisorConfig, partial: &PartialAdvisorConfig) -> AdvisorConfig {
        AdvisorConfig {
            base_url: partial
                .base_url
                .clone()
                .unwrap_or_else(|| base.base_url.clone()),
            request_timeout_secs: partial
                .request_timeout_secs
                .unwrap_or(base.request_timeout_secs),
            state_dir: partial
                .state_dir
                .clone()
                .unwrap_or_else(|| base.state_dir.clone()),
            shutdown_grace_ms: partial.shutdown_grace_ms.unwrap_or(base.shutdown_grace_ms),
        }
    }
}

impl Default for ConfigMerger {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolve the effective configuration from the config file and CLI/env overrides
pub fn load_config(config_file: &Path, cli: PartialAdvisorConfig) -> Result<AdvisorConfig> {
    let file = PartialAdvisorConfig::load_file(config_file)?;
    if file.is_some() {
        log::debug!("Loaded config file {}", config_file.display());
    }

    let config = ConfigMerger::new().with_file(file).with_cli(Some(cli)).merge();
    config.validate()?;
    Ok(config)
}
