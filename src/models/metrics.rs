//! Metric line data model

use serde::{Deserialize, Serialize};
use std::fmt;

/// Namespace prepended to every metric key
pub const METRIC_NAMESPACE: &str = "httping";

/// The six metrics a probe run can produce, in emission order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MetricKind {
    SuccessCount,
    ErrorCount,
    Max,
    Min,
    Average,
    Percentile90,
}

impl MetricKind {
    /// Suffix after the key prefix, e.g. `_rtt_ms.max`
    pub fn suffix(&self) -> &'static str {
        match self {
            MetricKind::SuccessCount => "_rtt_count.success",
            MetricKind::ErrorCount => "_rtt_count.error",
            MetricKind::Max => "_rtt_ms.max",
            MetricKind::Min => "_rtt_ms.min",
            MetricKind::Average => "_rtt_ms.average",
            MetricKind::Percentile90 => "_rtt_ms.90_percentile",
        }
    }

    /// Full metric key for the given prefix
    pub fn key(&self, key_prefix: &str) -> String {
        format!("{}.{}{}", METRIC_NAMESPACE, key_prefix, self.suffix())
    }
}

/// One `key\tvalue\ttimestamp` line for the metrics collector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricLine {
    pub key: String,
    pub value: f64,
    /// Seconds since the Unix epoch
    pub timestamp: i64,
}

impl MetricLine {
    pub fn new(kind: MetricKind, key_prefix: &str, value: f64, timestamp: i64) -> Self {
        Self {
            key: kind.key(key_prefix),
            value,
            timestamp,
        }
    }
}

impl fmt::Display for MetricLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\t{:.6}\t{}", self.key, self.value, self.timestamp)
    }
}
