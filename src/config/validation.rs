//! Non-fatal configuration checks
//!
//! `ProbeConfig::validate` rejects configurations the probe cannot run with.
//! The checks here only flag settings that are legal but likely unintended.

use crate::{error::Result, models::ProbeConfig};
use colored::Colorize;

/// Configuration validator producing advisory warnings
pub struct ConfigValidator;

impl ConfigValidator {
    /// Run the hard validation, then collect advisory warnings
    pub fn validate_comprehensive(config: &ProbeConfig) -> Result<Vec<ValidationWarning>> {
        config.validate()?;

        let mut warnings = Vec::new();
        warnings.extend(Self::validate_target_url(&config.url));
        warnings.extend(Self::validate_timing_settings(config));
        warnings.extend(Self::validate_key_prefix(&config.key_prefix));

        if config.disable_keepalive {
            warnings.push(ValidationWarning::new(
                ValidationLevel::Info,
                "Keep-alive disabled: every sample includes connection setup".to_string(),
            ));
        }

        Ok(warnings)
    }

    fn validate_target_url(url: &str) -> Vec<ValidationWarning> {
        let mut warnings = Vec::new();

        let parsed = match url::Url::parse(url.trim()) {
            Ok(parsed) => parsed,
            Err(e) => {
                warnings.push(ValidationWarning::new(
                    ValidationLevel::Warning,
                    format!("URL '{}' cannot be parsed ({}); no request will be sent", url, e),
                ));
                return warnings;
            }
        };

        if !matches!(parsed.scheme(), "http" | "https") {
            warnings.push(ValidationWarning::new(
                ValidationLevel::Warning,
                format!("URL '{}' uses unsupported scheme '{}'; no request will be sent", url, parsed.scheme()),
            ));
        }

        match parsed.host() {
            Some(url::Host::Ipv4(ip)) if ip.is_private() || ip.is_loopback() => {
                warnings.push(ValidationWarning::new(
                    ValidationLevel::Info,
                    format!("URL '{}' targets a private/local address", url),
                ));
            }
            Some(url::Host::Ipv6(ip)) if ip.is_loopback() => {
                warnings.push(ValidationWarning::new(
                    ValidationLevel::Info,
                    format!("URL '{}' targets a local address", url),
                ));
            }
            _ => {}
        }

        warnings
    }

    fn validate_timing_settings(config: &ProbeConfig) -> Vec<ValidationWarning> {
        let mut warnings = Vec::new();

        if config.count == 0 {
            warnings.push(ValidationWarning::new(
                ValidationLevel::Warning,
                "Count is 0: only the warm-up request will be sent and no timings reported".to_string(),
            ));
        } else if config.count > 1000 {
            warnings.push(ValidationWarning::new(
                ValidationLevel::Info,
                format!("High count of {} will take a long time", config.count),
            ));
        }

        if config.interval_ms == 0 && config.count > 1 {
            warnings.push(ValidationWarning::new(
                ValidationLevel::Warning,
                "Interval is 0: requests are sent back to back".to_string(),
            ));
        }

        if config.timeout_ms < 100 {
            warnings.push(ValidationWarning::new(
                ValidationLevel::Warning,
                format!("Timeout of {}ms may be too short for reliable measurements", config.timeout_ms),
            ));
        } else if config.timeout_ms > 60_000 {
            warnings.push(ValidationWarning::new(
                ValidationLevel::Info,
                format!("Long timeout of {}ms will slow down failure detection", config.timeout_ms),
            ));
        }

        warnings
    }

    fn validate_key_prefix(prefix: &str) -> Vec<ValidationWarning> {
        let unusual: Vec<char> = prefix
            .chars()
            .filter(|c| !(c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.')))
            .collect();

        if unusual.is_empty() {
            return Vec::new();
        }

        vec![ValidationWarning::new(
            ValidationLevel::Warning,
            format!(
                "Key prefix '{}' contains characters metric collectors may reject: {:?}",
                prefix, unusual
            ),
        )]
    }
}

/// Validation warning levels
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ValidationLevel {
    Info,
    Warning,
}

impl ValidationLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Warning => "WARNING",
        }
    }
}

/// Configuration validation warning
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub level: ValidationLevel,
    pub message: String,
}

impl ValidationWarning {
    pub fn new(level: ValidationLevel, message: String) -> Self {
        Self { level, message }
    }

    /// Format warning for display
    pub fn format(&self, use_color: bool) -> String {
        let tag = format!("[{}]", self.level.as_str());
        let tag = match (use_color, self.level) {
            (false, _) => tag,
            (true, ValidationLevel::Info) => tag.blue().to_string(),
            (true, ValidationLevel::Warning) => tag.yellow().to_string(),
        };
        format!("{} {}", tag, self.message)
    }
}

/// Convenience function for comprehensive configuration validation
pub fn validate_config(config: &ProbeConfig) -> Result<Vec<ValidationWarning>> {
    ConfigValidator::validate_comprehensive(config)
}
