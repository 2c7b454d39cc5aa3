//! Roll-up math for aggregation results (PRD-73).
//!
//! Pure reshaping of raw aggregation buckets into display-ready records:
//! zero-filling status maps, failure-rate computation, per-hour and
//! per-type folds, and display truncation. All inputs arrive as plain
//! values; BSON decoding happens upstream in `jobscope-db`.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::status::{status_key, JobStatus};
use crate::types::{Timestamp, TypeId};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Maximum characters of free text (cause labels, error messages) shown in
/// a table cell before the ellipsis marker is appended. Independent of the
/// query-side byte truncation and the export character limit.
pub const DISPLAY_LABEL_CHARS: usize = 60;

/// Marker appended to display-truncated text.
pub const ELLIPSIS: &str = "...";

/// Maximum rows kept in the per-type breakdown table.
pub const TYPE_BREAKDOWN_LIMIT: usize = 15;

// ---------------------------------------------------------------------------
// Truncation
// ---------------------------------------------------------------------------

/// Truncate free text to [`DISPLAY_LABEL_CHARS`] characters, appending
/// [`ELLIPSIS`] when anything was cut.
///
/// Idempotent: a string that already carries the marker and fits within
/// `DISPLAY_LABEL_CHARS + ELLIPSIS` characters is returned unchanged, so
/// re-normalizing never produces a double ellipsis.
pub fn truncate_label(s: &str) -> String {
    let len = s.chars().count();
    if len <= DISPLAY_LABEL_CHARS {
        return s.to_string();
    }
    if s.ends_with(ELLIPSIS) && len <= DISPLAY_LABEL_CHARS + ELLIPSIS.chars().count() {
        return s.to_string();
    }
    let mut out: String = s.chars().take(DISPLAY_LABEL_CHARS).collect();
    out.push_str(ELLIPSIS);
    out
}

/// Plain character truncation with no marker. Used for the export limit,
/// where the record must stay machine-consumable.
pub fn truncate_chars(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        s.chars().take(max_chars).collect()
    }
}

// ---------------------------------------------------------------------------
// Rates
// ---------------------------------------------------------------------------

/// Round to one decimal place.
pub fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

/// Failure rate as a percentage in `[0, 100]`, one decimal.
///
/// Exactly `0.0` when `total == 0`; never divides by zero and never
/// returns NaN.
pub fn failure_rate_pct(failed: i64, total: i64) -> f64 {
    if total <= 0 {
        return 0.0;
    }
    let rate = failed as f64 / total as f64 * 100.0;
    round1(rate.clamp(0.0, 100.0))
}

/// Health percentage: the complement of the failure rate.
pub fn health_pct(failed: i64, total: i64) -> f64 {
    round1(100.0 - failure_rate_pct(failed, total))
}

/// Milliseconds to seconds, one decimal.
pub fn ms_to_secs(ms: f64) -> f64 {
    round1(ms / 1000.0)
}

// ---------------------------------------------------------------------------
// Status counts
// ---------------------------------------------------------------------------

/// Fold raw `(status key, count)` buckets into a complete status map.
///
/// Missing or empty keys fold to `"unknown"`, duplicate keys are summed,
/// and the `completed` / `failed` keys are always present (zero-filled)
/// so downstream rate computations never index a missing key.
pub fn fold_status_counts(
    buckets: impl IntoIterator<Item = (Option<String>, i64)>,
) -> BTreeMap<String, i64> {
    let mut counts: BTreeMap<String, i64> = BTreeMap::new();
    for (key, count) in buckets {
        let key = status_key(key.as_deref());
        *counts.entry(key).or_insert(0) += count;
    }
    for required in [JobStatus::Completed, JobStatus::Failed] {
        counts.entry(required.as_str().to_string()).or_insert(0);
    }
    counts
}

/// Total job count across a status map.
pub fn total_jobs(counts: &BTreeMap<String, i64>) -> i64 {
    counts.values().sum()
}

// ---------------------------------------------------------------------------
// Hourly failure rates
// ---------------------------------------------------------------------------

/// Failure rate for one hour bucket of the timeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HourlyRate {
    pub hour: Timestamp,
    pub total_jobs: i64,
    pub failed: i64,
    pub failure_rate_pct: f64,
}

/// Derive per-hour failure rates from `(hour, status key, count)` buckets.
///
/// Output is sorted ascending by hour; each hour's rate follows the same
/// zero-total rule as [`failure_rate_pct`].
pub fn hourly_failure_rates(
    buckets: impl IntoIterator<Item = (Timestamp, Option<String>, i64)>,
) -> Vec<HourlyRate> {
    let mut per_hour: BTreeMap<Timestamp, (i64, i64)> = BTreeMap::new();
    for (hour, status, count) in buckets {
        let entry = per_hour.entry(hour).or_insert((0, 0));
        entry.0 += count;
        if JobStatus::from_stored(status.as_deref()) == JobStatus::Failed {
            entry.1 += count;
        }
    }
    per_hour
        .into_iter()
        .map(|(hour, (total, failed))| HourlyRate {
            hour,
            total_jobs: total,
            failed,
            failure_rate_pct: failure_rate_pct(failed, total),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Per-type breakdown
// ---------------------------------------------------------------------------

/// One row of the per-artifact-type breakdown table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypeBreakdownRow {
    pub type_id: TypeId,
    pub type_name: String,
    pub total: i64,
    pub failed: i64,
    pub completed: i64,
    pub failure_rate_pct: f64,
}

/// Fold `(type id, status key, count)` buckets into breakdown rows.
///
/// Type names are resolved through `resolve` (the catalog lookup). Rows are
/// sorted by total descending and capped at [`TYPE_BREAKDOWN_LIMIT`]; ties
/// break on type id so the output is deterministic.
pub fn fold_type_breakdown(
    buckets: impl IntoIterator<Item = (TypeId, Option<String>, i64)>,
    resolve: impl Fn(&str) -> String,
) -> Vec<TypeBreakdownRow> {
    let mut per_type: BTreeMap<TypeId, (i64, i64, i64)> = BTreeMap::new();
    for (type_id, status, count) in buckets {
        let entry = per_type.entry(type_id).or_insert((0, 0, 0));
        entry.0 += count;
        match JobStatus::from_stored(status.as_deref()) {
            JobStatus::Failed => entry.1 += count,
            JobStatus::Completed => entry.2 += count,
            _ => {}
        }
    }

    let mut rows: Vec<TypeBreakdownRow> = per_type
        .into_iter()
        .map(|(type_id, (total, failed, completed))| TypeBreakdownRow {
            type_name: resolve(&type_id),
            failure_rate_pct: failure_rate_pct(failed, total),
            type_id,
            total,
            failed,
            completed,
        })
        .collect();
    rows.sort_by(|a, b| {
        b.total
            .cmp(&a.total)
            .then_with(|| a.type_id.cmp(&b.type_id))
    });
    rows.truncate(TYPE_BREAKDOWN_LIMIT);
    rows
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    fn hour(h: u32) -> Timestamp {
        Utc.with_ymd_and_hms(2025, 6, 15, h, 0, 0).unwrap()
    }

    // -- truncation --

    #[test]
    fn short_labels_pass_through() {
        assert_eq!(truncate_label("disk full"), "disk full");
    }

    #[test]
    fn long_labels_get_the_marker() {
        let long = "x".repeat(61);
        let out = truncate_label(&long);
        assert_eq!(out.chars().count(), DISPLAY_LABEL_CHARS + 3);
        assert!(out.ends_with(ELLIPSIS));
    }

    #[test]
    fn label_truncation_is_idempotent() {
        let long = "x".repeat(200);
        let once = truncate_label(&long);
        let twice = truncate_label(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn exactly_limit_chars_is_untouched() {
        let s = "y".repeat(DISPLAY_LABEL_CHARS);
        assert_eq!(truncate_label(&s), s);
    }

    #[test]
    fn char_truncation_counts_chars_not_bytes() {
        let s = "é".repeat(10);
        assert_eq!(truncate_chars(&s, 4).chars().count(), 4);
        assert_eq!(truncate_chars(&s, 20), s);
    }

    // -- rates --

    #[test]
    fn zero_total_is_exactly_zero() {
        assert_eq!(failure_rate_pct(0, 0), 0.0);
        assert_eq!(failure_rate_pct(5, 0), 0.0);
    }

    #[test]
    fn rate_is_rounded_to_one_decimal() {
        assert_eq!(failure_rate_pct(1, 3), 33.3);
        assert_eq!(failure_rate_pct(2, 3), 66.7);
    }

    #[test]
    fn rate_stays_in_bounds() {
        assert_eq!(failure_rate_pct(10, 10), 100.0);
        // Counts larger than the total can't push the rate past 100.
        assert_eq!(failure_rate_pct(11, 10), 100.0);
    }

    #[test]
    fn health_is_complement_of_failure_rate() {
        assert_eq!(health_pct(15, 100), 85.0);
        assert_eq!(health_pct(0, 0), 100.0);
    }

    // -- status folding --

    #[test]
    fn status_map_always_has_completed_and_failed() {
        let counts = fold_status_counts(vec![(Some("running".to_string()), 5)]);
        assert_eq!(counts["completed"], 0);
        assert_eq!(counts["failed"], 0);
        assert_eq!(counts["running"], 5);
    }

    #[test]
    fn missing_keys_fold_to_unknown() {
        let counts = fold_status_counts(vec![(None, 2), (Some(String::new()), 3)]);
        assert_eq!(counts["unknown"], 5);
    }

    #[test]
    fn bucket_sum_equals_total() {
        let counts = fold_status_counts(vec![
            (Some("completed".to_string()), 80),
            (Some("failed".to_string()), 15),
            (Some("running".to_string()), 5),
        ]);
        assert_eq!(total_jobs(&counts), 100);
        assert_eq!(counts["completed"], 80);
        assert_eq!(counts["failed"], 15);
        assert_eq!(counts["running"], 5);
    }

    // -- hourly rates --

    #[test]
    fn hourly_rates_are_sorted_ascending() {
        let rates = hourly_failure_rates(vec![
            (hour(14), Some("completed".to_string()), 3),
            (hour(12), Some("failed".to_string()), 1),
            (hour(12), Some("completed".to_string()), 4),
            (hour(13), Some("completed".to_string()), 2),
        ]);
        let hours: Vec<_> = rates.iter().map(|r| r.hour).collect();
        let mut sorted = hours.clone();
        sorted.sort();
        assert_eq!(hours, sorted);
    }

    #[test]
    fn hourly_rates_match_overall_rate() {
        let buckets = vec![
            (hour(1), Some("completed".to_string()), 40),
            (hour(1), Some("failed".to_string()), 10),
            (hour(2), Some("completed".to_string()), 40),
            (hour(2), Some("failed".to_string()), 10),
        ];
        let rates = hourly_failure_rates(buckets);
        let failed: i64 = rates.iter().map(|r| r.failed).sum();
        let total: i64 = rates.iter().map(|r| r.total_jobs).sum();
        assert_eq!(failure_rate_pct(failed, total), 20.0);
        for r in &rates {
            assert_eq!(r.failure_rate_pct, 20.0);
        }
    }

    #[test]
    fn hour_with_no_failures_has_zero_rate() {
        let rates =
            hourly_failure_rates(vec![(hour(3), Some("completed".to_string()), 7)]);
        assert_eq!(rates[0].failure_rate_pct, 0.0);
        assert_eq!(rates[0].total_jobs, 7);
    }

    // -- type breakdown --

    #[test]
    fn breakdown_accumulates_per_type() {
        let rows = fold_type_breakdown(
            vec![
                ("a".to_string(), Some("completed".to_string()), 8),
                ("a".to_string(), Some("failed".to_string()), 2),
                ("b".to_string(), Some("running".to_string()), 1),
            ],
            |id| format!("name-{id}"),
        );
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].type_id, "a");
        assert_eq!(rows[0].type_name, "name-a");
        assert_eq!(rows[0].total, 10);
        assert_eq!(rows[0].failed, 2);
        assert_eq!(rows[0].completed, 8);
        assert_eq!(rows[0].failure_rate_pct, 20.0);
        // Running counts toward the total but neither failed nor completed.
        assert_eq!(rows[1].total, 1);
        assert_eq!(rows[1].failed, 0);
        assert_eq!(rows[1].completed, 0);
        assert_eq!(rows[1].failure_rate_pct, 0.0);
    }

    #[test]
    fn breakdown_is_sorted_by_total_and_capped() {
        let buckets: Vec<_> = (0..20)
            .map(|i| (format!("t{i:02}"), Some("completed".to_string()), i as i64 + 1))
            .collect();
        let rows = fold_type_breakdown(buckets, |id| id.to_string());
        assert_eq!(rows.len(), TYPE_BREAKDOWN_LIMIT);
        assert!(rows.windows(2).all(|w| w[0].total >= w[1].total));
        assert_eq!(rows[0].total, 20);
    }
}
