//! One full render cycle (PRD-73).
//!
//! Issues the planner's pipelines sequentially on the shared connection,
//! normalizes each result set, and assembles the [`Snapshot`]. The first
//! database error aborts the whole cycle; partial results are discarded so
//! the dashboard never mixes stale and fresh panels.

use bson::Document;
use jobscope_core::catalog::TypeCatalog;
use jobscope_core::filter::FilterState;
use jobscope_core::rollup::{failure_rate_pct, health_pct, ms_to_secs, round1, total_jobs};
use jobscope_core::status::JobStatus;
use mongodb::Collection;

use crate::models::dashboard::{DashboardSnapshot, RecentJobRow, Snapshot};
use crate::normalize;
use crate::pipelines::DurationSource;
use crate::repositories::JobStatsRepo;

/// Run every dashboard pipeline for one filter and assemble the snapshot.
///
/// Short-circuits to [`Snapshot::Empty`] when the window holds no jobs at
/// all; the error-analysis pipelines run only when the window has failed
/// jobs. The type breakdown always runs (its window-only predicate is part
/// of its contract).
pub async fn build_snapshot(
    coll: &Collection<Document>,
    filter: &FilterState,
    catalog: &TypeCatalog,
    source: DurationSource,
) -> Result<Snapshot, mongodb::error::Error> {
    let status_buckets = JobStatsRepo::status_counts(coll, filter).await?;
    let status_counts = normalize::status_counts(status_buckets);
    let total = total_jobs(&status_counts);

    if total == 0 {
        tracing::debug!(
            window_start = %filter.time_start,
            window_end = %filter.time_end,
            "No jobs in window",
        );
        return Ok(Snapshot::Empty {
            window_start: filter.time_start,
            window_end: filter.time_end,
        });
    }

    let completed = status_counts[JobStatus::Completed.as_str()];
    let failed = status_counts[JobStatus::Failed.as_str()];
    let running = status_counts
        .get(JobStatus::Running.as_str())
        .copied()
        .unwrap_or(0);

    let avg_duration_secs = JobStatsRepo::avg_duration(coll, filter, source)
        .await?
        .and_then(|row| row.avg_duration)
        .map(round1);
    let avg_pending_secs = JobStatsRepo::avg_pending(coll, filter)
        .await?
        .and_then(|row| row.avg_pending)
        .map(ms_to_secs);

    let (timeline, hourly_failure_rates) =
        normalize::timeline(JobStatsRepo::hourly_timeline(coll, filter).await?);

    let errors = if failed > 0 {
        let categories = JobStatsRepo::error_categories(coll, filter).await?;
        let causes = JobStatsRepo::top_root_causes(coll, filter).await?;
        let activities = JobStatsRepo::failed_activities(coll, filter).await?;
        Some(normalize::error_overview(categories, causes, activities))
    } else {
        None
    };

    let type_breakdown =
        normalize::type_breakdown(JobStatsRepo::type_breakdown(coll, filter).await?, catalog);
    let pending_by_type =
        normalize::pending_by_type(JobStatsRepo::pending_by_type(coll, filter).await?, catalog);

    tracing::debug!(total, completed, failed, running, "Snapshot assembled");

    Ok(Snapshot::Ready(DashboardSnapshot {
        window_start: filter.time_start,
        window_end: filter.time_end,
        total_jobs: total,
        completed,
        failed,
        running,
        failure_rate_pct: failure_rate_pct(failed, total),
        health_pct: health_pct(failed, total),
        avg_duration_secs,
        avg_pending_secs,
        status_counts,
        timeline,
        hourly_failure_rates,
        errors,
        type_breakdown,
        pending_by_type,
    }))
}

/// Fetch and normalize the recent-jobs table for the same filter.
pub async fn recent_jobs(
    coll: &Collection<Document>,
    filter: &FilterState,
    catalog: &TypeCatalog,
) -> Result<Vec<RecentJobRow>, mongodb::error::Error> {
    let jobs = JobStatsRepo::recent_jobs(coll, filter).await?;
    Ok(jobs
        .into_iter()
        .map(|job| normalize::recent_job_row(job, catalog))
        .collect())
}
