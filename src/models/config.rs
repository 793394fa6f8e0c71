//! Probe configuration data model and validation

use crate::types::{AppError, DnsStrategy, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration of a single probe run. Read-only once the run starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeConfig {
    /// Target URL. Parsed by the measurement loop, not here.
    pub url: String,

    /// Per-request timeout budget in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Sleep before each measured request in milliseconds
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,

    /// Number of measured requests
    #[serde(default = "default_count")]
    pub count: u32,

    /// Used verbatim in metric key names
    pub key_prefix: String,

    /// Close connections after every request instead of pooling them
    #[serde(default)]
    pub disable_keepalive: bool,

    /// Resolver caching policy
    #[serde(default)]
    pub dns_strategy: DnsStrategy,

    /// Enable verbose diagnostics
    #[serde(default)]
    pub verbose: bool,

    /// Enable debug diagnostics
    #[serde(default)]
    pub debug: bool,

    /// Enable colored diagnostics
    #[serde(default = "default_enable_color")]
    pub enable_color: bool,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            timeout_ms: default_timeout_ms(),
            interval_ms: default_interval_ms(),
            count: default_count(),
            key_prefix: String::new(),
            disable_keepalive: false,
            dns_strategy: DnsStrategy::default(),
            verbose: false,
            debug: false,
            enable_color: default_enable_color(),
        }
    }
}

impl ProbeConfig {
    /// Create a configuration for the given target and key prefix, other fields defaulted
    pub fn new<U: Into<String>, K: Into<String>>(url: U, key_prefix: K) -> Self {
        Self {
            url: url.into(),
            key_prefix: key_prefix.into(),
            ..Self::default()
        }
    }

    /// Get timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Get interval as Duration
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    /// Validate the configuration.
    ///
    /// The URL is only checked for presence: a malformed URL is reported by the
    /// measurement loop, which emits zeroed count metrics before failing.
    pub fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(AppError::config("Target URL is required (--url or HTTPING_URL)"));
        }

        if self.key_prefix.is_empty() {
            return Err(AppError::config("Metric key prefix is required (--key-prefix or HTTPING_KEY_PREFIX)"));
        }

        if self.key_prefix.chars().any(|c| c.is_whitespace()) {
            return Err(AppError::config(format!(
                "Metric key prefix must not contain whitespace: {:?}",
                self.key_prefix
            )));
        }

        if self.timeout_ms == 0 {
            return Err(AppError::config("Timeout must be greater than 0"));
        }

        Ok(())
    }

    /// Merge HTTPING_* environment variables into this configuration
    pub fn merge_from_env(&mut self) -> Result<()> {
        if let Ok(url) = std::env::var("HTTPING_URL") {
            self.url = url.trim().to_string();
        }

        if let Ok(prefix) = std::env::var("HTTPING_KEY_PREFIX") {
            self.key_prefix = prefix.trim().to_string();
        }

        if let Ok(timeout) = std::env::var("HTTPING_TIMEOUT") {
            self.timeout_ms = timeout.trim().parse()
                .map_err(|e| AppError::config(format!("Invalid HTTPING_TIMEOUT value '{}': {}", timeout, e)))?;
        }

        if let Ok(interval) = std::env::var("HTTPING_INTERVAL") {
            self.interval_ms = interval.trim().parse()
                .map_err(|e| AppError::config(format!("Invalid HTTPING_INTERVAL value '{}': {}", interval, e)))?;
        }

        if let Ok(count) = std::env::var("HTTPING_COUNT") {
            self.count = count.trim().parse()
                .map_err(|e| AppError::config(format!("Invalid HTTPING_COUNT value '{}': {}", count, e)))?;
        }

        if let Ok(disable) = std::env::var("HTTPING_DISABLE_KEEPALIVE") {
            self.disable_keepalive = disable.trim().parse()
                .map_err(|e| AppError::config(format!("Invalid HTTPING_DISABLE_KEEPALIVE value '{}': {}", disable, e)))?;
        }

        if let Ok(strategy) = std::env::var("HTTPING_DNS_STRATEGY") {
            self.dns_strategy = strategy.parse()?;
        }

        if std::env::var("NO_COLOR").is_ok() {
            self.enable_color = false;
        }

        Ok(())
    }
}

// Default value functions for serde
fn default_timeout_ms() -> u64 {
    crate::defaults::DEFAULT_TIMEOUT_MS
}

fn default_interval_ms() -> u64 {
    crate::defaults::DEFAULT_INTERVAL_MS
}

fn default_count() -> u32 {
    crate::defaults::DEFAULT_COUNT
}

fn default_enable_color() -> bool {
    crate::defaults::DEFAULT_ENABLE_COLOR
}
