//! Sample collection and latency aggregation
//!
//! Percentiles use a nearest-rank estimator: `index = round(fraction * n) - 1`,
//! clamped to the sample range. Halfway cases round to the even integer, so
//! five samples put the 90th percentile at index 3, not 4.

#[cfg(test)]
mod comprehensive_tests;

use crate::models::MetricKind;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::time::Duration;

/// Fraction used for the reported high percentile
pub const P90_FRACTION: f64 = 0.90;

/// Successful round-trip samples plus success/error bookkeeping for one run
#[derive(Debug, Clone, Default)]
pub struct SampleSet {
    samples: Vec<f64>,
    sum_ms: f64,
    error_count: u64,
}

impl SampleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Preallocate room for the expected number of samples
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            samples: Vec::with_capacity(capacity),
            ..Self::default()
        }
    }

    /// Record a successful attempt
    pub fn record_success(&mut self, elapsed: Duration) {
        self.record_success_ms(duration_to_ms(elapsed));
    }

    /// Record a successful attempt already expressed in milliseconds
    pub fn record_success_ms(&mut self, rtt_ms: f64) {
        self.samples.push(rtt_ms);
        self.sum_ms += rtt_ms;
    }

    /// Record a failed attempt
    pub fn record_error(&mut self) {
        self.error_count += 1;
    }

    pub fn success_count(&self) -> u64 {
        self.samples.len() as u64
    }

    pub fn error_count(&self) -> u64 {
        self.error_count
    }

    /// Successes plus errors
    pub fn attempts(&self) -> u64 {
        self.success_count() + self.error_count
    }

    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    pub fn sum_ms(&self) -> f64 {
        self.sum_ms
    }

    /// Sort the samples and compute the final summary
    pub fn summarize(mut self) -> LatencySummary {
        self.samples.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));

        let success_count = self.success_count();
        let timings = LatencyStats::from_sorted(&self.samples, self.sum_ms);

        LatencySummary {
            success_count,
            error_count: self.error_count,
            timings,
        }
    }
}

/// Final per-run aggregates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatencySummary {
    pub success_count: u64,
    pub error_count: u64,
    /// `None` when no attempt succeeded
    pub timings: Option<LatencyStats>,
}

impl LatencySummary {
    /// Summary of a run that never got to send a request
    pub fn aborted(count: u32) -> Self {
        Self {
            success_count: 0,
            error_count: count as u64,
            timings: None,
        }
    }

    /// Count metrics in emission order
    pub fn count_values(&self) -> [(MetricKind, f64); 2] {
        [
            (MetricKind::SuccessCount, self.success_count as f64),
            (MetricKind::ErrorCount, self.error_count as f64),
        ]
    }

    pub fn success_rate(&self) -> f64 {
        let total = self.success_count + self.error_count;
        if total == 0 {
            0.0
        } else {
            self.success_count as f64 / total as f64
        }
    }
}

/// Timing aggregates over the successful samples, in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatencyStats {
    pub max_ms: f64,
    pub min_ms: f64,
    pub average_ms: f64,
    pub p90_ms: f64,
}

impl LatencyStats {
    /// Compute stats from ascending samples and their sum. Returns `None` for no samples.
    pub fn from_sorted(sorted: &[f64], sum_ms: f64) -> Option<Self> {
        let count = sorted.len();
        let max_index = nearest_rank_index(1.0, count)?;
        let p90_index = nearest_rank_index(P90_FRACTION, count)?;

        Some(Self {
            max_ms: sorted[max_index],
            min_ms: sorted[0],
            average_ms: sum_ms / count as f64,
            p90_ms: sorted[p90_index],
        })
    }

    /// Timing metrics in emission order
    pub fn metric_values(&self) -> [(MetricKind, f64); 4] {
        [
            (MetricKind::Max, self.max_ms),
            (MetricKind::Min, self.min_ms),
            (MetricKind::Average, self.average_ms),
            (MetricKind::Percentile90, self.p90_ms),
        ]
    }
}

/// Nearest-rank index `round(fraction * count) - 1`, clamped to `0..count`.
///
/// Ties round half to even. Returns `None` when there are no samples.
pub fn nearest_rank_index(fraction: f64, count: usize) -> Option<usize> {
    if count == 0 {
        return None;
    }

    let rank = (fraction * count as f64).round_ties_even() as i64 - 1;
    Some(rank.clamp(0, count as i64 - 1) as usize)
}

/// Convert a duration to fractional milliseconds
pub fn duration_to_ms(duration: Duration) -> f64 {
    duration.as_nanos() as f64 / 1_000_000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary_of(samples: &[f64], errors: u64) -> LatencySummary {
        let mut set = SampleSet::new();
        for &sample in samples {
            set.record_success_ms(sample);
        }
        for _ in 0..errors {
            set.record_error();
        }
        set.summarize()
    }

    #[test]
    fn test_fixed_latencies() {
        let summary = summary_of(&[30.0, 10.0, 50.0, 20.0, 40.0], 0);
        let timings = summary.timings.unwrap();

        assert_eq!(summary.success_count, 5);
        assert_eq!(summary.error_count, 0);
        assert_eq!(timings.average_ms, 30.0);
        assert_eq!(timings.min_ms, 10.0);
        assert_eq!(timings.max_ms, 50.0);
        assert_eq!(timings.p90_ms, 40.0);
    }

    #[test]
    fn test_single_sample() {
        let timings = summary_of(&[7.5], 3).timings.unwrap();
        assert_eq!(timings.min_ms, 7.5);
        assert_eq!(timings.max_ms, 7.5);
        assert_eq!(timings.average_ms, 7.5);
        assert_eq!(timings.p90_ms, 7.5);
    }

    #[test]
    fn test_no_successes_have_no_timings() {
        let summary = summary_of(&[], 4);
        assert_eq!(summary.success_count, 0);
        assert_eq!(summary.error_count, 4);
        assert!(summary.timings.is_none());
    }

    #[test]
    fn test_nearest_rank_index_halfway_rounds_to_even() {
        // 0.9 * 5 = 4.5 -> 4
        assert_eq!(nearest_rank_index(P90_FRACTION, 5), Some(3));
        // 0.9 * 15 = 13.5 -> 14
        assert_eq!(nearest_rank_index(P90_FRACTION, 15), Some(13));
        // 0.9 * 25 = 22.5 -> 22
        assert_eq!(nearest_rank_index(P90_FRACTION, 25), Some(21));
    }

    #[test]
    fn test_nearest_rank_index_regular_values() {
        assert_eq!(nearest_rank_index(P90_FRACTION, 1), Some(0));
        assert_eq!(nearest_rank_index(P90_FRACTION, 2), Some(1));
        assert_eq!(nearest_rank_index(P90_FRACTION, 10), Some(8));
        assert_eq!(nearest_rank_index(P90_FRACTION, 100), Some(89));
        assert_eq!(nearest_rank_index(1.0, 7), Some(6));
    }

    #[test]
    fn test_nearest_rank_index_clamps() {
        assert_eq!(nearest_rank_index(0.0, 4), Some(0));
        assert_eq!(nearest_rank_index(0.1, 1), Some(0));
        assert_eq!(nearest_rank_index(0.9, 0), None);
    }

    #[test]
    fn test_counts_track_attempts() {
        let mut set = SampleSet::with_capacity(3);
        set.record_success(Duration::from_millis(12));
        set.record_error();
        set.record_success(Duration::from_micros(1500));

        assert_eq!(set.success_count(), 2);
        assert_eq!(set.error_count(), 1);
        assert_eq!(set.attempts(), 3);
        assert_eq!(set.samples(), &[12.0, 1.5]);
        assert!((set.sum_ms() - 13.5).abs() < 1e-9);
    }

    #[test]
    fn test_duration_to_ms_keeps_sub_millisecond_precision() {
        assert_eq!(duration_to_ms(Duration::from_nanos(2_500_000)), 2.5);
        assert_eq!(duration_to_ms(Duration::ZERO), 0.0);
    }

    #[test]
    fn test_aborted_summary() {
        let summary = LatencySummary::aborted(10);
        assert_eq!(summary.success_count, 0);
        assert_eq!(summary.error_count, 10);
        assert!(summary.timings.is_none());
        assert_eq!(summary.success_rate(), 0.0);
        assert_eq!(
            summary.count_values(),
            [(MetricKind::SuccessCount, 0.0), (MetricKind::ErrorCount, 10.0)]
        );
    }

    #[test]
    fn test_metric_values_in_emission_order() {
        let timings = summary_of(&[10.0, 20.0, 30.0, 40.0, 50.0], 0).timings.unwrap();
        assert_eq!(
            timings.metric_values(),
            [
                (MetricKind::Max, 50.0),
                (MetricKind::Min, 10.0),
                (MetricKind::Average, 30.0),
                (MetricKind::Percentile90, 40.0),
            ]
        );
    }
}
