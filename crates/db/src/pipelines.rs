//! Aggregation planner (PRD-73).
//!
//! Maps a [`FilterState`] to the fixed set of named pipeline specifications
//! the dashboard needs. Builders are pure: they construct BSON stage lists
//! and execute nothing. Server-side stages carry every bound (`$limit`,
//! window predicates) so no pipeline can scan unbounded.

use bson::oid::ObjectId;
use bson::{doc, Bson, Document};
use jobscope_core::filter::FilterState;
use jobscope_core::status::CASCADE_ERROR_NAME;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Query-side byte prefix grouped on for root cause messages. Distinct from
/// the 60-char display truncation and the 200-char export truncation.
pub const CAUSE_PREFIX_BYTES: i32 = 100;

/// Grouping-key fallback when a cause or activity is not recorded.
pub const UNKNOWN_LABEL: &str = "Unknown";

/// Top-N cap for the root-cause chart.
pub const TOP_CAUSES_LIMIT: i32 = 10;

/// Top-N cap for the failed-activities chart.
pub const FAILED_ACTIVITIES_LIMIT: i32 = 15;

/// Top-N cap for the pending-time-by-type table.
pub const PENDING_BY_TYPE_LIMIT: i32 = 15;

/// Document cap for the recent-jobs table.
pub const RECENT_JOBS_LIMIT: i64 = 50;

/// Document cap for the failed-jobs export.
pub const EXPORT_LIMIT: i64 = 5000;

// ---------------------------------------------------------------------------
// Duration source
// ---------------------------------------------------------------------------

/// Where the measured job duration lives. The two stored schema versions
/// disagree, so the source is configuration rather than a guess.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DurationSource {
    /// `execution.totalDuration` (the newer schema).
    #[default]
    TotalDuration,
    /// First element of `execution.durations` (the older schema).
    FirstOfDurations,
}

impl DurationSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            DurationSource::TotalDuration => "total",
            DurationSource::FirstOfDurations => "first",
        }
    }

    /// Parse from configuration, defaulting to the newer schema.
    pub fn from_str(s: &str) -> Self {
        match s {
            "first" => DurationSource::FirstOfDurations,
            _ => DurationSource::TotalDuration,
        }
    }
}

// ---------------------------------------------------------------------------
// Match predicates
// ---------------------------------------------------------------------------

/// Window + artifact type predicate shared by every type-filtered query.
///
/// Catalog ids are stringified ObjectIds; an id that fails to parse cannot
/// exist in the collection and is skipped rather than failing the render.
pub fn base_filter(filter: &FilterState) -> Document {
    let type_oids: Vec<ObjectId> = filter
        .type_ids
        .iter()
        .filter_map(|id| ObjectId::parse_str(id).ok())
        .collect();
    doc! {
        "createdAt": {
            "$gte": bson::DateTime::from_chrono(filter.time_start),
            "$lte": bson::DateTime::from_chrono(filter.time_end),
        },
        "artifactTypeId": { "$in": type_oids },
    }
}

/// Window-only predicate. The type breakdown deliberately ignores the type
/// selection so the table always shows the full type distribution.
pub fn time_only_filter(filter: &FilterState) -> Document {
    doc! {
        "createdAt": {
            "$gte": bson::DateTime::from_chrono(filter.time_start),
            "$lte": bson::DateTime::from_chrono(filter.time_end),
        },
    }
}

/// Predicate for the failed-jobs export: the base window restricted to
/// failures, optionally excluding cascading child-workflow failures.
pub fn export_filter(filter: &FilterState, omit_cascade: bool) -> Document {
    let mut query = base_filter(filter);
    query.insert("status", "failed");
    if omit_cascade {
        query.insert("error.name", doc! { "$ne": CASCADE_ERROR_NAME });
    }
    query
}

/// Projection for the recent-jobs table.
pub fn recent_projection() -> Document {
    doc! {
        "status": 1,
        "createdAt": 1,
        "artifactTypeId": 1,
        "error.rootCauseMessage": 1,
    }
}

/// Projection for the failed-jobs export.
pub fn export_projection() -> Document {
    doc! {
        "status": 1,
        "createdAt": 1,
        "artifactTypeId": 1,
        "error": 1,
    }
}

// ---------------------------------------------------------------------------
// Pipelines
// ---------------------------------------------------------------------------

/// Group by status within the window: drives totals, health, and the
/// status pie.
pub fn status_counts(filter: &FilterState) -> Vec<Document> {
    vec![
        doc! { "$match": base_filter(filter) },
        doc! { "$group": { "_id": "$status", "count": { "$sum": 1 } } },
    ]
}

/// Average measured duration over jobs that have one.
///
/// A duration that is missing or `<= 0` is not-yet-measured and excluded
/// from the average entirely, never treated as zero.
pub fn avg_duration(filter: &FilterState, source: DurationSource) -> Vec<Document> {
    let (field, value): (&str, Bson) = match source {
        DurationSource::TotalDuration => {
            ("execution.totalDuration", Bson::from("$execution.totalDuration"))
        }
        DurationSource::FirstOfDurations => (
            "execution.durations.0",
            Bson::from(doc! { "$arrayElemAt": ["$execution.durations", 0] }),
        ),
    };
    vec![
        doc! { "$match": base_filter(filter) },
        doc! { "$match": { field: { "$exists": true, "$gt": 0 } } },
        doc! { "$group": {
            "_id": null,
            "avgDuration": { "$avg": value },
            "count": { "$sum": 1 },
        } },
    ]
}

/// Average pending time (`startTime - createdAt`) over positive values.
///
/// Negative or missing pending times are excluded before the `$group`, so
/// they never drag the average toward zero.
pub fn avg_pending(filter: &FilterState) -> Vec<Document> {
    vec![
        doc! { "$match": base_filter(filter) },
        doc! { "$match": { "startTime": { "$exists": true } } },
        doc! { "$project": {
            "pendingMs": { "$subtract": ["$startTime", "$createdAt"] },
        } },
        doc! { "$match": { "pendingMs": { "$gt": 0 } } },
        doc! { "$group": { "_id": null, "avgPending": { "$avg": "$pendingMs" } } },
    ]
}

/// Per-(hour, status) counts, hour truncated to the calendar boundary in
/// the stored timezone (UTC), sorted ascending by hour.
pub fn hourly_timeline(filter: &FilterState) -> Vec<Document> {
    vec![
        doc! { "$match": base_filter(filter) },
        doc! { "$group": {
            "_id": {
                "hour": { "$dateTrunc": { "date": "$createdAt", "unit": "hour" } },
                "status": "$status",
            },
            "count": { "$sum": 1 },
        } },
        doc! { "$sort": { "_id.hour": 1 } },
    ]
}

/// Two-way split of failed jobs: `cascade` when the error name is the
/// child-workflow sentinel, `root` for everything else. Every failed job
/// lands in exactly one bucket.
pub fn error_categorization(filter: &FilterState) -> Vec<Document> {
    vec![
        doc! { "$match": base_filter(filter) },
        doc! { "$match": { "status": "failed" } },
        doc! { "$group": {
            "_id": {
                "$cond": [
                    { "$eq": ["$error.name", CASCADE_ERROR_NAME] },
                    "cascade",
                    "root",
                ],
            },
            "count": { "$sum": 1 },
        } },
    ]
}

/// Top root-failure causes, grouped by the first [`CAUSE_PREFIX_BYTES`]
/// bytes of the message so near-identical long messages collapse.
pub fn top_root_causes(filter: &FilterState) -> Vec<Document> {
    vec![
        doc! { "$match": base_filter(filter) },
        doc! { "$match": {
            "status": "failed",
            "error.name": { "$ne": CASCADE_ERROR_NAME },
        } },
        doc! { "$group": {
            "_id": { "$substrBytes": [
                { "$ifNull": ["$error.rootCauseMessage", UNKNOWN_LABEL] },
                0,
                CAUSE_PREFIX_BYTES,
            ] },
            "count": { "$sum": 1 },
        } },
        doc! { "$sort": { "count": -1 } },
        doc! { "$limit": TOP_CAUSES_LIMIT },
    ]
}

/// Failed activity names among root failures, most frequent first.
pub fn failed_activities(filter: &FilterState) -> Vec<Document> {
    vec![
        doc! { "$match": base_filter(filter) },
        doc! { "$match": {
            "status": "failed",
            "error.name": { "$ne": CASCADE_ERROR_NAME },
        } },
        doc! { "$group": {
            "_id": { "$ifNull": ["$error.failedActivity.name", UNKNOWN_LABEL] },
            "count": { "$sum": 1 },
        } },
        doc! { "$sort": { "count": -1 } },
        doc! { "$limit": FAILED_ACTIVITIES_LIMIT },
    ]
}

/// Per-(artifact type, status) counts over the window-only predicate.
pub fn type_breakdown(filter: &FilterState) -> Vec<Document> {
    vec![
        doc! { "$match": time_only_filter(filter) },
        doc! { "$group": {
            "_id": { "artifactTypeId": "$artifactTypeId", "status": "$status" },
            "count": { "$sum": 1 },
        } },
    ]
}

/// Average and maximum positive pending time per artifact type, slowest
/// types first.
pub fn pending_by_type(filter: &FilterState) -> Vec<Document> {
    vec![
        doc! { "$match": base_filter(filter) },
        doc! { "$match": { "startTime": { "$exists": true } } },
        doc! { "$project": {
            "artifactTypeId": 1,
            "pendingMs": { "$subtract": ["$startTime", "$createdAt"] },
        } },
        doc! { "$match": { "pendingMs": { "$gt": 0 } } },
        doc! { "$group": {
            "_id": "$artifactTypeId",
            "avgPending": { "$avg": "$pendingMs" },
            "maxPending": { "$max": "$pendingMs" },
            "count": { "$sum": 1 },
        } },
        doc! { "$sort": { "avgPending": -1 } },
        doc! { "$limit": PENDING_BY_TYPE_LIMIT },
    ]
}

// ---------------------------------------------------------------------------
// Plan
// ---------------------------------------------------------------------------

/// A named, declarative pipeline: match predicate, grouping, derived
/// metrics, sort order, and limit, all as server-side stages.
#[derive(Debug, Clone)]
pub struct PipelineSpec {
    pub name: &'static str,
    pub stages: Vec<Document>,
}

/// The full ordered plan for one render cycle.
pub fn plan(filter: &FilterState, source: DurationSource) -> Vec<PipelineSpec> {
    vec![
        PipelineSpec { name: "status_counts", stages: status_counts(filter) },
        PipelineSpec { name: "avg_duration", stages: avg_duration(filter, source) },
        PipelineSpec { name: "avg_pending", stages: avg_pending(filter) },
        PipelineSpec { name: "hourly_timeline", stages: hourly_timeline(filter) },
        PipelineSpec { name: "error_categorization", stages: error_categorization(filter) },
        PipelineSpec { name: "top_root_causes", stages: top_root_causes(filter) },
        PipelineSpec { name: "failed_activities", stages: failed_activities(filter) },
        PipelineSpec { name: "type_breakdown", stages: type_breakdown(filter) },
        PipelineSpec { name: "pending_by_type", stages: pending_by_type(filter) },
    ]
}
