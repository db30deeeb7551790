//! Aggregation of per-row predictions into a [`PredictionSummary`].

use std::collections::BTreeMap;

use crate::activity::{activity_name, ActivityId, NULL_ACTIVITY};
use crate::models::PredictionSummary;

// ---

/// Fraction of null-activity rows above which a log is flagged.
pub const ANOMALY_THRESHOLD: f64 = 0.5;

/// Summarize predicted labels.
///
/// The dominant activity is the most frequent label, ties going to the
/// smallest id. Distribution values are rounded to 3 decimals and only cover
/// observed labels. The anomaly flag compares the rounded null-activity
/// fraction against [`ANOMALY_THRESHOLD`].
pub fn summarize(labels: &[ActivityId]) -> PredictionSummary {
    // ---
    let mut counts: BTreeMap<ActivityId, usize> = BTreeMap::new();
    for label in labels {
        *counts.entry(*label).or_default() += 1;
    }

    // Ascending key order plus strict `>` keeps the smallest id on ties
    let mut dominant = (NULL_ACTIVITY, 0usize);
    for (label, count) in &counts {
        if *count > dominant.1 {
            dominant = (*label, *count);
        }
    }

    let total = labels.len();
    let activity_distribution: BTreeMap<ActivityId, f64> = counts
        .iter()
        .map(|(label, count)| (*label, round3(*count as f64 / total as f64)))
        .collect();

    let null_fraction = activity_distribution
        .get(&NULL_ACTIVITY)
        .copied()
        .unwrap_or(0.0);

    PredictionSummary {
        predicted_activity_id: dominant.0,
        predicted_activity_name: activity_name(dominant.0).to_string(),
        activity_distribution,
        rows_evaluated: total,
        is_anomaly: null_fraction > ANOMALY_THRESHOLD,
    }
}

/// Round to 3 decimals, halves to even.
fn round3(value: f64) -> f64 {
    (value * 1000.0).round_ties_even() / 1000.0
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    fn labels(groups: &[(ActivityId, usize)]) -> Vec<ActivityId> {
        // ---
        groups
            .iter()
            .flat_map(|(label, n)| std::iter::repeat(*label).take(*n))
            .collect()
    }

    #[test]
    fn test_walking_majority() {
        // ---
        let summary = summarize(&labels(&[(0, 400), (4, 600)]));

        assert_eq!(summary.predicted_activity_id, 4);
        assert_eq!(summary.predicted_activity_name, "Walking");
        assert_eq!(summary.activity_distribution.len(), 2);
        assert_eq!(summary.activity_distribution[&0], 0.4);
        assert_eq!(summary.activity_distribution[&4], 0.6);
        assert_eq!(summary.rows_evaluated, 1000);
        assert!(!summary.is_anomaly);
    }

    #[test]
    fn test_null_majority_is_anomaly() {
        // ---
        let summary = summarize(&labels(&[(0, 600), (1, 400)]));

        assert_eq!(summary.predicted_activity_id, 0);
        assert!(summary.is_anomaly);
    }

    #[test]
    fn test_exactly_half_null_is_not_anomaly() {
        // ---
        let summary = summarize(&labels(&[(0, 500), (3, 500)]));
        assert!(!summary.is_anomaly);
    }

    #[test]
    fn test_tie_breaks_to_smallest_id() {
        // ---
        // Order of appearance must not matter
        let summary = summarize(&labels(&[(9, 10), (2, 10), (5, 10)]));
        assert_eq!(summary.predicted_activity_id, 2);

        let summary = summarize(&labels(&[(2, 10), (9, 10), (5, 3)]));
        assert_eq!(summary.predicted_activity_id, 2);
    }

    #[test]
    fn test_distribution_rounding_and_sum() {
        // ---
        let summary = summarize(&labels(&[(1, 1), (2, 1), (3, 1)]));

        for value in summary.activity_distribution.values() {
            assert_eq!(*value, 0.333);
        }
        let sum: f64 = summary.activity_distribution.values().sum();
        let tolerance = 0.003 * summary.activity_distribution.len() as f64;
        assert!((sum - 1.0).abs() <= tolerance);
    }

    #[test]
    fn test_half_way_fractions_round_to_even() {
        // ---
        let summary = summarize(&labels(&[(4, 1999), (5, 1)]));
        assert_eq!(summary.activity_distribution[&4], 1.0);
        assert_eq!(summary.activity_distribution[&5], 0.0);

        let summary = summarize(&labels(&[(4, 15), (5, 1)]));
        assert_eq!(summary.activity_distribution[&5], 0.062);
        assert_eq!(summary.activity_distribution[&4], 0.938);
    }

    #[test]
    fn test_unobserved_labels_are_omitted() {
        // ---
        let summary = summarize(&labels(&[(7, 3)]));

        assert_eq!(summary.activity_distribution.len(), 1);
        assert_eq!(summary.activity_distribution[&7], 1.0);
        assert!(!summary.activity_distribution.contains_key(&0));
        assert!(!summary.is_anomaly);
    }

    #[test]
    fn test_out_of_table_id_gets_unknown_name() {
        // ---
        let summary = summarize(&[42, 42, 1]);
        assert_eq!(summary.predicted_activity_id, 42);
        assert_eq!(summary.predicted_activity_name, "Unknown activity");
    }

    #[test]
    fn test_empty_input() {
        // ---
        let summary = summarize(&[]);

        assert_eq!(summary.rows_evaluated, 0);
        assert_eq!(summary.predicted_activity_id, 0);
        assert!(summary.activity_distribution.is_empty());
        assert!(!summary.is_anomaly);
    }
}
