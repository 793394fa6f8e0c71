//! Type definitions and aliases

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// Re-export commonly used types
pub use crate::error::{AppError, Result};

/// How resolved addresses for the target host are cached between dials
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DnsStrategy {
    /// Resolve on first dial and keep the answer for the whole process
    #[default]
    Once,
    /// Keep answers for a bounded TTL and refresh stale entries in the background
    Refresh,
}

impl DnsStrategy {
    /// Get a human-readable name for this strategy
    pub fn name(&self) -> &'static str {
        match self {
            DnsStrategy::Once => "once",
            DnsStrategy::Refresh => "refresh",
        }
    }
}

impl fmt::Display for DnsStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DnsStrategy {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "once" | "static" => Ok(DnsStrategy::Once),
            "refresh" | "ttl" => Ok(DnsStrategy::Refresh),
            other => Err(AppError::parse(format!(
                "Unknown DNS strategy '{}' (expected 'once' or 'refresh')",
                other
            ))),
        }
    }
}

/// Phases of a single probe run. The run only ever moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunPhase {
    Idle,
    WarmUp,
    Measuring,
    Aggregating,
    Done,
}

impl RunPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunPhase::Idle => "idle",
            RunPhase::WarmUp => "warm_up",
            RunPhase::Measuring => "measuring",
            RunPhase::Aggregating => "aggregating",
            RunPhase::Done => "done",
        }
    }
}
