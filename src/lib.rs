//! httping probe
//!
//! Measures HTTP time-to-first-byte against a single target URL: one
//! unmeasured warm-up request, then a fixed number of spaced requests, then
//! success/error counts and min/max/average/90th percentile latency written
//! as tab-separated metric lines for a metrics collector.

pub mod cli;
pub mod client;
pub mod config;
pub mod dns;
pub mod error;
pub mod executor;
pub mod logging;
pub mod models;
pub mod output;
pub mod stats;
pub mod types;

// Re-export commonly used types
pub use error::{AppError, Result};
pub use models::{MetricKind, MetricLine, ProbeConfig};
pub use stats::{LatencyStats, LatencySummary, SampleSet};
pub use executor::ProbeExecutor;
pub use output::MetricsEmitter;

/// Application version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const PKG_NAME: &str = env!("CARGO_PKG_NAME");
pub const PKG_DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Default configuration values
pub mod defaults {
    use std::time::Duration;

    pub const DEFAULT_TIMEOUT_MS: u64 = 5000;
    pub const DEFAULT_INTERVAL_MS: u64 = 200;
    pub const DEFAULT_COUNT: u32 = 10;
    pub const DEFAULT_ENABLE_COLOR: bool = true;
    /// Positive TTL of the refreshing resolver cache
    pub const DNS_CACHE_TTL: Duration = Duration::from_secs(600);
}
