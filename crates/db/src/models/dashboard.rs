//! Aggregation bucket models and the dashboard snapshot (PRD-73).
//!
//! One raw bucket struct per pipeline, decoded from the aggregation output
//! at the repository boundary. The display records at the bottom are what
//! the HTTP surface serializes for the rendering layer.

use std::collections::BTreeMap;

use bson::oid::ObjectId;
use jobscope_core::rollup::{HourlyRate, TypeBreakdownRow};
use jobscope_core::types::Timestamp;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Raw aggregation buckets
// ---------------------------------------------------------------------------

/// Output of `status_counts`: one bucket per status value in the window.
#[derive(Debug, Clone, Deserialize)]
pub struct StatusBucket {
    /// Grouping key; missing when the stored status field is absent.
    #[serde(rename = "_id")]
    pub status: Option<String>,
    pub count: i64,
}

/// Output of `avg_duration`: a single document, or nothing when no job in
/// the window has a measured duration.
#[derive(Debug, Clone, Deserialize)]
pub struct AvgDurationRow {
    #[serde(rename = "avgDuration")]
    pub avg_duration: Option<f64>,
    pub count: i64,
}

/// Output of `avg_pending`: a single document over the positive pending
/// times in the window.
#[derive(Debug, Clone, Deserialize)]
pub struct AvgPendingRow {
    #[serde(rename = "avgPending")]
    pub avg_pending: Option<f64>,
}

/// Compound grouping key of the hourly timeline.
#[derive(Debug, Clone, Deserialize)]
pub struct TimelineKey {
    pub hour: bson::DateTime,
    #[serde(default)]
    pub status: Option<String>,
}

/// Output of `hourly_timeline`: one bucket per (hour, status) pair,
/// sorted ascending by hour server-side.
#[derive(Debug, Clone, Deserialize)]
pub struct TimelineBucket {
    #[serde(rename = "_id")]
    pub key: TimelineKey,
    pub count: i64,
}

/// Output of `error_categorization`: at most two buckets, keyed
/// `"cascade"` or `"root"`.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorCategoryBucket {
    #[serde(rename = "_id")]
    pub category: String,
    pub count: i64,
}

/// Output of `top_root_causes`: cause prefix (first 100 bytes) and count.
#[derive(Debug, Clone, Deserialize)]
pub struct CauseBucket {
    #[serde(rename = "_id")]
    pub cause: String,
    pub count: i64,
}

/// Output of `failed_activities`: activity name and count.
#[derive(Debug, Clone, Deserialize)]
pub struct ActivityBucket {
    #[serde(rename = "_id")]
    pub activity: String,
    pub count: i64,
}

/// Compound grouping key of the per-type breakdown.
#[derive(Debug, Clone, Deserialize)]
pub struct TypeStatusKey {
    #[serde(rename = "artifactTypeId")]
    pub artifact_type_id: Option<ObjectId>,
    #[serde(default)]
    pub status: Option<String>,
}

/// Output of `type_breakdown`: one bucket per (artifact type, status)
/// pair over the time-only window.
#[derive(Debug, Clone, Deserialize)]
pub struct TypeStatusBucket {
    #[serde(rename = "_id")]
    pub key: TypeStatusKey,
    pub count: i64,
}

/// Output of `pending_by_type`: average and maximum positive pending time
/// per artifact type, milliseconds.
#[derive(Debug, Clone, Deserialize)]
pub struct PendingTypeBucket {
    #[serde(rename = "_id")]
    pub artifact_type_id: Option<ObjectId>,
    #[serde(rename = "avgPending")]
    pub avg_pending: f64,
    #[serde(rename = "maxPending")]
    pub max_pending: f64,
    pub count: i64,
}

// ---------------------------------------------------------------------------
// Display records
// ---------------------------------------------------------------------------

/// One point of the stacked hourly timeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelinePoint {
    pub hour: Timestamp,
    pub status: String,
    pub count: i64,
}

/// One row of the top-root-causes chart, display-truncated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CauseCount {
    pub cause: String,
    pub count: i64,
}

/// One row of the failed-activities chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivityCount {
    pub activity: String,
    pub count: i64,
}

/// Error analysis panel: root vs cascade split plus the two top-N charts.
/// Present only when the window has failed jobs.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorOverview {
    pub root_errors: i64,
    pub cascade_failures: i64,
    pub top_causes: Vec<CauseCount>,
    pub failed_activities: Vec<ActivityCount>,
}

/// One row of the pending-time-by-type table, seconds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PendingByTypeRow {
    pub type_id: String,
    pub type_name: String,
    pub avg_pending_secs: f64,
    pub max_pending_secs: f64,
    pub jobs: i64,
}

/// One row of the recent-jobs table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecentJobRow {
    pub id: String,
    pub created: String,
    pub type_name: String,
    pub status: String,
    /// Display-truncated root cause; only populated for failed jobs.
    pub error: Option<String>,
}

/// Everything one dashboard render needs, computed over a single
/// consistent window.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardSnapshot {
    pub window_start: Timestamp,
    pub window_end: Timestamp,
    pub total_jobs: i64,
    pub completed: i64,
    pub failed: i64,
    pub running: i64,
    pub failure_rate_pct: f64,
    pub health_pct: f64,
    /// Average measured duration in seconds; `None` when nothing in the
    /// window has a positive duration.
    pub avg_duration_secs: Option<f64>,
    /// Average positive pending time in seconds; `None` when absent.
    pub avg_pending_secs: Option<f64>,
    pub status_counts: BTreeMap<String, i64>,
    pub timeline: Vec<TimelinePoint>,
    pub hourly_failure_rates: Vec<HourlyRate>,
    pub errors: Option<ErrorOverview>,
    pub type_breakdown: Vec<TypeBreakdownRow>,
    pub pending_by_type: Vec<PendingByTypeRow>,
}

/// Result of one render cycle. An empty window is a distinct display
/// state, not an error; it short-circuits every downstream panel.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Snapshot {
    Empty {
        window_start: Timestamp,
        window_end: Timestamp,
    },
    Ready(DashboardSnapshot),
}
