//! Environment variable handling and .env file management

use crate::error::{AppError, Result};
use crate::types::DnsStrategy;
use std::path::Path;

/// Default location of the environment file
pub const ENV_FILE: &str = ".env";

/// Environment variable configuration manager
pub struct EnvManager;

impl EnvManager {
    /// Load an environment file if it exists.
    ///
    /// Variables already present in the process environment are left alone.
    pub fn load_env_file_from(path: &Path) -> Result<bool> {
        if !path.exists() {
            return Ok(false);
        }

        dotenv::from_path(path)
            .map_err(|e| AppError::config(format!("Failed to load {}: {}", path.display(), e)))?;
        Ok(true)
    }

    /// Validate environment variable format before parsing
    pub fn validate_env_var(key: &str, value: &str) -> Result<()> {
        let value = value.trim();
        match key {
            "HTTPING_URL" => {
                if value.is_empty() {
                    return Err(AppError::config("HTTPING_URL must not be empty"));
                }
            }
            "HTTPING_KEY_PREFIX" => {
                if value.is_empty() || value.chars().any(char::is_whitespace) {
                    return Err(AppError::config(format!(
                        "HTTPING_KEY_PREFIX must be non-empty without whitespace, got: '{}'",
                        value
                    )));
                }
            }
            "HTTPING_TIMEOUT" => {
                let timeout: u64 = value
                    .parse()
                    .map_err(|e| AppError::config(format!("Invalid HTTPING_TIMEOUT value '{}': {}", value, e)))?;
                if timeout == 0 {
                    return Err(AppError::config("HTTPING_TIMEOUT must be greater than 0"));
                }
            }
            "HTTPING_INTERVAL" => {
                value
                    .parse::<u64>()
                    .map_err(|e| AppError::config(format!("Invalid HTTPING_INTERVAL value '{}': {}", value, e)))?;
            }
            "HTTPING_COUNT" => {
                value
                    .parse::<u32>()
                    .map_err(|e| AppError::config(format!("Invalid HTTPING_COUNT value '{}': {}", value, e)))?;
            }
            "HTTPING_DISABLE_KEEPALIVE" => {
                value.parse::<bool>().map_err(|e| {
                    AppError::config(format!("Invalid HTTPING_DISABLE_KEEPALIVE value '{}': {}", value, e))
                })?;
            }
            "HTTPING_DNS_STRATEGY" => {
                value.parse::<DnsStrategy>()?;
            }
            _ => {
                // Unknown environment variable, ignore
            }
        }

        Ok(())
    }

    /// Get list of all supported environment variables with descriptions
    pub fn get_supported_env_vars() -> Vec<(&'static str, &'static str, &'static str)> {
        vec![
            ("HTTPING_URL", "URL to ping", "https://example.com/health"),
            ("HTTPING_KEY_PREFIX", "Metric key prefix", "example"),
            ("HTTPING_TIMEOUT", "Timeout per ping in milliseconds", "5000"),
            ("HTTPING_INTERVAL", "Sleep before every measured ping in milliseconds", "200"),
            ("HTTPING_COUNT", "Number of measured pings", "10"),
            ("HTTPING_DISABLE_KEEPALIVE", "Close the connection after every request", "false"),
            ("HTTPING_DNS_STRATEGY", "Resolver caching (once or refresh)", "once"),
        ]
    }

    /// Display environment variable help
    pub fn display_env_help() -> String {
        let mut help = String::new();
        help.push_str("Supported Environment Variables:\n\n");

        for (var, description, example) in Self::get_supported_env_vars() {
            help.push_str(&format!("  {:<26} {}\n", var, description));
            help.push_str(&format!("  {:<26} Example: {}\n\n", "", example));
        }
        help.push_str(&format!("  {:<26} {}\n\n", "NO_COLOR", "Disable colored diagnostics when set"));

        help.push_str("Configuration Priority (highest to lowest):\n");
        help.push_str("  1. Command-line arguments\n");
        help.push_str("  2. Environment variables\n");
        help.push_str("  3. .env file values\n");
        help.push_str("  4. Default values\n");

        help
    }

    /// Validate every supported variable present in the process environment.
    ///
    /// Runs after the `.env` file is loaded, so file values are checked too.
    pub fn validate_current_env() -> Result<()> {
        for (var_name, _, _) in Self::get_supported_env_vars() {
            if let Ok(value) = std::env::var(var_name) {
                Self::validate_env_var(var_name, &value)?;
            }
        }
        Ok(())
    }
}
