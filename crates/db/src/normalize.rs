//! Result normalizer (PRD-73).
//!
//! Turns the typed aggregation buckets into complete, display-ready
//! records: zero-filled status maps, resolved type names, display
//! truncation, and derived rates. Everything here is pure; the math lives
//! in `jobscope_core::rollup`.

use std::collections::BTreeMap;

use bson::oid::ObjectId;
use jobscope_core::catalog::TypeCatalog;
use jobscope_core::rollup::{
    fold_status_counts, fold_type_breakdown, hourly_failure_rates, ms_to_secs,
    truncate_label, HourlyRate, TypeBreakdownRow,
};
use jobscope_core::status::{status_key, JobStatus};

use crate::models::dashboard::{
    ActivityBucket, ActivityCount, CauseBucket, CauseCount, ErrorCategoryBucket,
    ErrorOverview, PendingByTypeRow, PendingTypeBucket, RecentJobRow, StatusBucket,
    TimelineBucket, TimelinePoint, TypeStatusBucket,
};
use crate::models::job::JobDocument;

/// Placeholder when a failed job carries no root cause message.
const NO_MESSAGE: &str = "No message";

/// Fallback key for documents with no artifact type id.
const UNKNOWN_TYPE_KEY: &str = "unknown";

fn type_key(id: Option<ObjectId>) -> String {
    id.map(|o| o.to_hex())
        .unwrap_or_else(|| UNKNOWN_TYPE_KEY.to_string())
}

/// Complete status map: unknown-key fold, duplicate sum, zero-filled
/// `completed` / `failed`.
pub fn status_counts(buckets: Vec<StatusBucket>) -> BTreeMap<String, i64> {
    fold_status_counts(buckets.into_iter().map(|b| (b.status, b.count)))
}

/// Timeline points plus the derived per-hour failure rates.
pub fn timeline(buckets: Vec<TimelineBucket>) -> (Vec<TimelinePoint>, Vec<HourlyRate>) {
    let points: Vec<TimelinePoint> = buckets
        .iter()
        .map(|b| TimelinePoint {
            hour: b.key.hour.to_chrono(),
            status: status_key(b.key.status.as_deref()),
            count: b.count,
        })
        .collect();
    let rates = hourly_failure_rates(
        buckets
            .into_iter()
            .map(|b| (b.key.hour.to_chrono(), b.key.status, b.count)),
    );
    (points, rates)
}

/// Error analysis panel from the three error pipelines.
///
/// The category split is a two-way partition; absent buckets mean zero.
/// Cause labels get the display truncation here, on top of the query-side
/// byte-prefix grouping.
pub fn error_overview(
    categories: Vec<ErrorCategoryBucket>,
    causes: Vec<CauseBucket>,
    activities: Vec<ActivityBucket>,
) -> ErrorOverview {
    let mut root_errors = 0;
    let mut cascade_failures = 0;
    for bucket in categories {
        match bucket.category.as_str() {
            "cascade" => cascade_failures += bucket.count,
            _ => root_errors += bucket.count,
        }
    }
    ErrorOverview {
        root_errors,
        cascade_failures,
        top_causes: causes
            .into_iter()
            .map(|b| CauseCount {
                cause: truncate_label(&b.cause),
                count: b.count,
            })
            .collect(),
        failed_activities: activities
            .into_iter()
            .map(|b| ActivityCount {
                activity: b.activity,
                count: b.count,
            })
            .collect(),
    }
}

/// Per-type breakdown rows with resolved names.
pub fn type_breakdown(
    buckets: Vec<TypeStatusBucket>,
    catalog: &TypeCatalog,
) -> Vec<TypeBreakdownRow> {
    fold_type_breakdown(
        buckets
            .into_iter()
            .map(|b| (type_key(b.key.artifact_type_id), b.key.status, b.count)),
        |id| catalog.resolve(id),
    )
}

/// Pending-time rows, milliseconds converted to seconds.
pub fn pending_by_type(
    buckets: Vec<PendingTypeBucket>,
    catalog: &TypeCatalog,
) -> Vec<PendingByTypeRow> {
    buckets
        .into_iter()
        .map(|b| {
            let type_id = type_key(b.artifact_type_id);
            PendingByTypeRow {
                type_name: catalog.resolve(&type_id),
                type_id,
                avg_pending_secs: ms_to_secs(b.avg_pending),
                max_pending_secs: ms_to_secs(b.max_pending),
                jobs: b.count,
            }
        })
        .collect()
}

/// One recent-jobs table row.
///
/// The error column is populated only for failed jobs and carries the
/// display truncation; timestamps are rendered at second precision.
pub fn recent_job_row(job: JobDocument, catalog: &TypeCatalog) -> RecentJobRow {
    let status = JobStatus::from_stored(job.status.as_deref());
    let error = if status == JobStatus::Failed {
        Some(truncate_label(job.root_cause_message().unwrap_or(NO_MESSAGE)))
    } else {
        None
    };
    RecentJobRow {
        id: job.id.to_hex(),
        created: job
            .created_at
            .to_chrono()
            .format("%Y-%m-%d %H:%M:%S")
            .to_string(),
        type_name: catalog.resolve(&type_key(job.artifact_type_id)),
        status: status.as_str().to_string(),
        error,
    }
}

#[cfg(test)]
mod tests {
    use bson::doc;
    use bson::oid::ObjectId;
    use chrono::{TimeZone, Utc};
    use jobscope_core::rollup::total_jobs;

    use super::*;

    fn catalog() -> TypeCatalog {
        let mut m = std::collections::BTreeMap::new();
        m.insert("64a000000000000000000001".to_string(), "Render".to_string());
        TypeCatalog::from_map(m)
    }

    fn bson_hour(h: u32) -> bson::DateTime {
        bson::DateTime::from_chrono(Utc.with_ymd_and_hms(2025, 6, 15, h, 0, 0).unwrap())
    }

    #[test]
    fn status_counts_scenario_sums_to_total() {
        // 100 jobs: 80 completed, 15 failed, 5 running.
        let counts = status_counts(vec![
            StatusBucket { status: Some("completed".into()), count: 80 },
            StatusBucket { status: Some("failed".into()), count: 15 },
            StatusBucket { status: Some("running".into()), count: 5 },
        ]);
        assert_eq!(total_jobs(&counts), 100);
        assert_eq!(counts["completed"], 80);
        assert_eq!(counts["failed"], 15);
        assert_eq!(counts["running"], 5);
    }

    #[test]
    fn empty_buckets_still_yield_required_keys() {
        let counts = status_counts(Vec::new());
        assert_eq!(counts["completed"], 0);
        assert_eq!(counts["failed"], 0);
        assert_eq!(total_jobs(&counts), 0);
    }

    #[test]
    fn timeline_hours_are_non_decreasing() {
        let buckets = vec![
            TimelineBucket {
                key: crate::models::dashboard::TimelineKey {
                    hour: bson_hour(1),
                    status: Some("completed".into()),
                },
                count: 4,
            },
            TimelineBucket {
                key: crate::models::dashboard::TimelineKey {
                    hour: bson_hour(1),
                    status: Some("failed".into()),
                },
                count: 1,
            },
            TimelineBucket {
                key: crate::models::dashboard::TimelineKey {
                    hour: bson_hour(2),
                    status: None,
                },
                count: 2,
            },
        ];
        let (points, rates) = timeline(buckets);
        assert_eq!(points.len(), 3);
        assert_eq!(points[2].status, "unknown");
        assert!(rates.windows(2).all(|w| w[0].hour <= w[1].hour));
        assert_eq!(rates[0].failure_rate_pct, 20.0);
        assert_eq!(rates[1].failure_rate_pct, 0.0);
    }

    #[test]
    fn error_overview_scenario_splits_root_and_cascade() {
        // 15 failures: 3 cascading, 12 root.
        let overview = error_overview(
            vec![
                ErrorCategoryBucket { category: "root".into(), count: 12 },
                ErrorCategoryBucket { category: "cascade".into(), count: 3 },
            ],
            vec![
                CauseBucket { cause: "disk full".into(), count: 7 },
                CauseBucket { cause: "x".repeat(100), count: 5 },
            ],
            vec![ActivityBucket { activity: "render".into(), count: 12 }],
        );
        assert_eq!(overview.root_errors, 12);
        assert_eq!(overview.cascade_failures, 3);
        assert!(overview.top_causes.len() <= 10);
        let cause_total: i64 = overview.top_causes.iter().map(|c| c.count).sum();
        assert!(cause_total <= 12);
        // Long cause labels carry the display truncation.
        assert!(overview.top_causes[1].cause.ends_with("..."));
        assert_eq!(overview.top_causes[1].cause.chars().count(), 63);
    }

    #[test]
    fn missing_category_defaults_to_zero() {
        let overview = error_overview(
            vec![ErrorCategoryBucket { category: "root".into(), count: 4 }],
            Vec::new(),
            Vec::new(),
        );
        assert_eq!(overview.cascade_failures, 0);
        assert_eq!(overview.root_errors, 4);
    }

    #[test]
    fn type_breakdown_resolves_catalog_names() {
        let known = ObjectId::parse_str("64a000000000000000000001").unwrap();
        let other = ObjectId::parse_str("64a0000000000000000000ff").unwrap();
        let rows = type_breakdown(
            vec![
                TypeStatusBucket {
                    key: crate::models::dashboard::TypeStatusKey {
                        artifact_type_id: Some(known),
                        status: Some("completed".into()),
                    },
                    count: 9,
                },
                TypeStatusBucket {
                    key: crate::models::dashboard::TypeStatusKey {
                        artifact_type_id: Some(other),
                        status: Some("failed".into()),
                    },
                    count: 1,
                },
            ],
            &catalog(),
        );
        assert_eq!(rows[0].type_name, "Render");
        // Unknown ids fall back to their hex form.
        assert_eq!(rows[1].type_name, other.to_hex());
        assert_eq!(rows[1].failure_rate_pct, 100.0);
    }

    #[test]
    fn pending_rows_convert_to_seconds() {
        let rows = pending_by_type(
            vec![PendingTypeBucket {
                artifact_type_id: None,
                avg_pending: 1500.0,
                max_pending: 60_000.0,
                count: 4,
            }],
            &catalog(),
        );
        assert_eq!(rows[0].avg_pending_secs, 1.5);
        assert_eq!(rows[0].max_pending_secs, 60.0);
        assert_eq!(rows[0].type_name, "unknown");
    }

    #[test]
    fn recent_row_for_failed_job_carries_truncated_message() {
        let doc = doc! {
            "_id": ObjectId::new(),
            "status": "failed",
            "createdAt": bson_hour(9),
            "artifactTypeId": ObjectId::parse_str("64a000000000000000000001").unwrap(),
            "error": { "rootCauseMessage": "m".repeat(80) },
        };
        let job: JobDocument = bson::from_document(doc).unwrap();
        let row = recent_job_row(job, &catalog());
        assert_eq!(row.status, "failed");
        assert_eq!(row.type_name, "Render");
        assert_eq!(row.created, "2025-06-15 09:00:00");
        let error = row.error.unwrap();
        assert!(error.ends_with("..."));
        assert_eq!(error.chars().count(), 63);
    }

    #[test]
    fn recent_row_for_completed_job_has_no_error_column() {
        let doc = doc! {
            "_id": ObjectId::new(),
            "status": "completed",
            "createdAt": bson_hour(9),
        };
        let job: JobDocument = bson::from_document(doc).unwrap();
        let row = recent_job_row(job, &catalog());
        assert_eq!(row.error, None);
        assert_eq!(row.type_name, "unknown");
    }

    #[test]
    fn failed_job_without_message_gets_placeholder() {
        let doc = doc! {
            "_id": ObjectId::new(),
            "status": "failed",
            "createdAt": bson_hour(9),
            "error": {},
        };
        let job: JobDocument = bson::from_document(doc).unwrap();
        let row = recent_job_row(job, &catalog());
        assert_eq!(row.error.as_deref(), Some("No message"));
    }
}
