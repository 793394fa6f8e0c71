//! Property-based tests for the latency aggregator

use super::{nearest_rank_index, SampleSet, P90_FRACTION};
use proptest::collection::vec;
use proptest::prelude::*;

/// Generate plausible round-trip times in milliseconds
fn rtt_samples() -> impl Strategy<Value = Vec<f64>> {
    vec(0.01f64..30_000.0, 1..200)
}

proptest! {
    #[test]
    fn prop_min_max_bound_every_sample(samples in rtt_samples()) {
        let mut set = SampleSet::new();
        for &s in &samples {
            set.record_success_ms(s);
        }
        let timings = set.summarize().timings.unwrap();

        for &s in &samples {
            prop_assert!(timings.min_ms <= s);
            prop_assert!(timings.max_ms >= s);
        }
    }

    #[test]
    fn prop_average_is_arithmetic_mean(samples in rtt_samples()) {
        let mut set = SampleSet::new();
        for &s in &samples {
            set.record_success_ms(s);
        }
        let timings = set.summarize().timings.unwrap();

        let mean = samples.iter().sum::<f64>() / samples.len() as f64;
        prop_assert!((timings.average_ms - mean).abs() <= 1e-6 * mean.max(1.0));
    }

    #[test]
    fn prop_percentile_is_a_recorded_sample(samples in rtt_samples()) {
        let mut set = SampleSet::new();
        for &s in &samples {
            set.record_success_ms(s);
        }
        let timings = set.summarize().timings.unwrap();

        prop_assert!(samples.contains(&timings.p90_ms));
        prop_assert!(timings.p90_ms <= timings.max_ms);
        prop_assert!(timings.p90_ms >= timings.min_ms);
    }

    #[test]
    fn prop_counts_add_up(successes in 0usize..100, errors in 0u64..100) {
        let mut set = SampleSet::new();
        for i in 0..successes {
            set.record_success_ms(i as f64 + 1.0);
        }
        for _ in 0..errors {
            set.record_error();
        }
        prop_assert_eq!(set.attempts(), successes as u64 + errors);

        let summary = set.summarize();
        prop_assert_eq!(summary.success_count, successes as u64);
        prop_assert_eq!(summary.error_count, errors);
        prop_assert_eq!(summary.timings.is_some(), successes > 0);
    }

    #[test]
    fn prop_rank_index_in_range(count in 1usize..10_000, fraction in 0.0f64..=1.0) {
        let index = nearest_rank_index(fraction, count).unwrap();
        prop_assert!(index < count);
    }

    #[test]
    fn prop_p90_index_never_exceeds_max_index(count in 1usize..10_000) {
        let p90 = nearest_rank_index(P90_FRACTION, count).unwrap();
        let max = nearest_rank_index(1.0, count).unwrap();
        prop_assert!(p90 <= max);
        prop_assert_eq!(max, count - 1);
    }
}

#[test]
fn test_unsorted_input_with_duplicates() {
    let mut set = SampleSet::new();
    for s in [5.0, 1.0, 5.0, 3.0, 1.0, 9.0, 9.0, 2.0, 4.0, 7.0] {
        set.record_success_ms(s);
    }
    let timings = set.summarize().timings.unwrap();

    // sorted: 1 1 2 3 4 5 5 7 9 9, p90 index = round(9.0) - 1 = 8
    assert_eq!(timings.min_ms, 1.0);
    assert_eq!(timings.max_ms, 9.0);
    assert_eq!(timings.p90_ms, 9.0);
    assert!((timings.average_ms - 4.6).abs() < 1e-9);
}

#[test]
fn test_p90_for_twenty_samples() {
    let mut set = SampleSet::new();
    for i in (1..=20).rev() {
        set.record_success_ms(i as f64);
    }
    let timings = set.summarize().timings.unwrap();

    // round(18.0) - 1 = 17 -> the 18th smallest value
    assert_eq!(timings.p90_ms, 18.0);
    assert_eq!(timings.max_ms, 20.0);
    assert_eq!(timings.average_ms, 10.5);
}
