//! Metric line emission
//!
//! Metrics are the only thing written to the sink (stdout in the binary).
//! Each emission block samples the clock once so that all of its lines share
//! one timestamp.

use crate::{
    error::{ErrorContext, Result},
    models::MetricLine,
    stats::LatencySummary,
};
use std::io::Write;

/// Current time as whole seconds since the Unix epoch
pub fn unix_timestamp() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Metric lines for a summary, in emission order.
///
/// Counts always come first; the four timing lines follow only when at least
/// one attempt succeeded.
pub fn lines_for(summary: &LatencySummary, key_prefix: &str, timestamp: i64) -> Vec<MetricLine> {
    let timings = summary.timings.iter().flat_map(|stats| stats.metric_values());

    summary
        .count_values()
        .into_iter()
        .chain(timings)
        .map(|(kind, value)| MetricLine::new(kind, key_prefix, value, timestamp))
        .collect()
}

/// Writes metric lines to a sink
pub struct MetricsEmitter<W: Write> {
    sink: W,
    key_prefix: String,
    lines_written: usize,
}

impl<W: Write> MetricsEmitter<W> {
    pub fn new(sink: W, key_prefix: impl Into<String>) -> Self {
        Self {
            sink,
            key_prefix: key_prefix.into(),
            lines_written: 0,
        }
    }

    pub fn lines_written(&self) -> usize {
        self.lines_written
    }

    /// Emit a summary stamped with the current time
    pub fn emit(&mut self, summary: &LatencySummary) -> Result<()> {
        self.emit_at(summary, unix_timestamp())
    }

    /// Emit a summary with an explicit timestamp
    pub fn emit_at(&mut self, summary: &LatencySummary, timestamp: i64) -> Result<()> {
        let lines = lines_for(summary, &self.key_prefix, timestamp);
        self.write_block(&lines)
    }

    fn write_block(&mut self, lines: &[MetricLine]) -> Result<()> {
        for line in lines {
            writeln!(self.sink, "{}", line)
                .map_err(crate::AppError::from)
                .context("Failed to write metric line")?;
        }
        self.sink
            .flush()
            .map_err(crate::AppError::from)
            .context("Failed to flush metrics")?;
        self.lines_written += lines.len();
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.sink
    }
}
