//! Command-line interface
//!
//! Every value flag is optional: an unset flag falls through to the
//! environment, then the `.env` file, then the built-in default.

use crate::types::DnsStrategy;
use clap::Parser;

/// HTTP time-to-first-byte probe emitting latency metrics
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "httping-probe")]
#[command(about, long_about = None)]
#[command(disable_version_flag = true)]
pub struct Cli {
    /// URL to ping
    #[arg(long)]
    pub url: Option<String>,

    /// Timeout per ping in milliseconds [default: 5000]
    #[arg(long, value_name = "MS")]
    pub timeout: Option<u64>,

    /// Sleep before every measured ping in milliseconds [default: 200]
    #[arg(long, value_name = "MS")]
    pub interval: Option<u64>,

    /// Number of measured pings [default: 10]
    #[arg(long)]
    pub count: Option<u32>,

    /// Metric key prefix
    #[arg(long, value_name = "PREFIX")]
    pub key_prefix: Option<String>,

    /// Close the connection after every request
    #[arg(long)]
    pub disable_keepalive: bool,

    /// Resolver caching: `once` (process lifetime) or `refresh` (600s TTL)
    #[arg(long, value_name = "STRATEGY", value_parser = parse_dns_strategy)]
    pub dns_strategy: Option<DnsStrategy>,

    /// Log run progress to stderr
    #[arg(long)]
    pub verbose: bool,

    /// Log every attempt as JSON to stderr
    #[arg(long)]
    pub debug: bool,

    /// Disable colored diagnostics
    #[arg(long)]
    pub no_color: bool,

    /// List supported environment variables and exit
    #[arg(long)]
    pub help_env: bool,

    /// Show version
    #[arg(short = 'v', long)]
    pub version: bool,
}

impl Cli {
    /// Whether the invocation only asks for information (version, env help)
    pub fn is_info_request(&self) -> bool {
        self.version || self.help_env
    }

    /// Check if colors should be enabled
    pub fn use_colors(&self) -> bool {
        !self.no_color && supports_color()
    }
}

fn parse_dns_strategy(s: &str) -> Result<DnsStrategy, String> {
    s.parse::<DnsStrategy>().map_err(|e| e.to_string())
}

/// Check if the terminal supports color output
fn supports_color() -> bool {
    if let Ok(term) = std::env::var("TERM") {
        if term == "dumb" {
            return false;
        }
    }

    if std::env::var("NO_COLOR").is_ok() {
        return false;
    }

    if std::env::var("FORCE_COLOR").is_ok() {
        return true;
    }

    cfg!(unix)
}
