//! Configuration parsing from CLI arguments and environment variables

use crate::{
    cli::Cli,
    config::env::{EnvManager, ENV_FILE},
    error::Result,
    models::ProbeConfig,
};
use std::path::PathBuf;

/// Configuration parser that combines CLI arguments with environment variables
pub struct ConfigParser {
    cli: Cli,
    env_file: Option<PathBuf>,
}

impl ConfigParser {
    /// Create a new configuration parser reading `./.env`
    pub fn new(cli: Cli) -> Self {
        Self {
            cli,
            env_file: Some(PathBuf::from(ENV_FILE)),
        }
    }

    /// Read environment defaults from a different file
    pub fn with_env_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.env_file = Some(path.into());
        self
    }

    /// Skip the environment file entirely
    pub fn without_env_file(mut self) -> Self {
        self.env_file = None;
        self
    }

    /// Parse and build the complete configuration
    pub fn parse(&self) -> Result<ProbeConfig> {
        let mut config = ProbeConfig::default();

        if let Some(path) = &self.env_file {
            EnvManager::load_env_file_from(path)?;
        }

        EnvManager::validate_current_env()?;
        config.merge_from_env()?;
        self.apply_cli_overrides(&mut config);
        config.validate()?;

        Ok(config)
    }

    fn apply_cli_overrides(&self, config: &mut ProbeConfig) {
        let cli = &self.cli;

        if let Some(url) = &cli.url {
            config.url = url.trim().to_string();
        }
        if let Some(prefix) = &cli.key_prefix {
            config.key_prefix = prefix.clone();
        }
        if let Some(timeout) = cli.timeout {
            config.timeout_ms = timeout;
        }
        if let Some(interval) = cli.interval {
            config.interval_ms = interval;
        }
        if let Some(count) = cli.count {
            config.count = count;
        }
        if let Some(strategy) = cli.dns_strategy {
            config.dns_strategy = strategy;
        }

        // Flags can only switch behavior on; an absent flag keeps the env value
        config.disable_keepalive |= cli.disable_keepalive;
        config.verbose |= cli.verbose;
        config.debug |= cli.debug;

        // --no-color, NO_COLOR and terminals without color support
        if !cli.use_colors() {
            config.enable_color = false;
        }
    }
}

/// Convenience function to load complete configuration from CLI arguments
pub fn load_config(cli: Cli) -> Result<ProbeConfig> {
    ConfigParser::new(cli).parse()
}

/// Display configuration summary for debug purposes
pub fn display_config_summary(config: &ProbeConfig) -> String {
    let summary = [
        format!("URL: {}", config.url),
        format!("Key Prefix: {}", config.key_prefix),
        format!("Timeout: {}ms", config.timeout_ms),
        format!("Interval: {}ms", config.interval_ms),
        format!("Count: {}", config.count),
        format!("Keep-alive: {}", if config.disable_keepalive { "disabled" } else { "enabled" }),
        format!("DNS Strategy: {}", config.dns_strategy),
        format!("Color Output: {}", config.enable_color),
        format!("Verbose: {}", config.verbose),
        format!("Debug: {}", config.debug),
    ];

    summary.join("\n")
}
