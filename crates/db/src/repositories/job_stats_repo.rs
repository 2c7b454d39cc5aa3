//! Repository for the `artifactJobs` collection (PRD-73).
//!
//! Executes the planner's aggregation pipelines and the two bounded `find`
//! paths, decoding every raw document into its typed bucket at this
//! boundary. Untyped documents never leave this module.

use bson::Document;
use futures::stream::TryStreamExt;
use jobscope_core::filter::FilterState;
use mongodb::Collection;
use serde::de::DeserializeOwned;

use crate::models::dashboard::{
    ActivityBucket, AvgDurationRow, AvgPendingRow, CauseBucket, ErrorCategoryBucket,
    PendingTypeBucket, StatusBucket, TimelineBucket, TypeStatusBucket,
};
use crate::models::job::JobDocument;
use crate::pipelines::{self, DurationSource};

/// Provides the dashboard's query operations.
pub struct JobStatsRepo;

impl JobStatsRepo {
    /// Run an aggregation and decode each result document.
    async fn aggregate<T: DeserializeOwned>(
        coll: &Collection<Document>,
        stages: Vec<Document>,
    ) -> Result<Vec<T>, mongodb::error::Error> {
        let mut cursor = coll.aggregate(stages).await?;
        let mut out = Vec::new();
        while let Some(doc) = cursor.try_next().await? {
            out.push(bson::from_document(doc)?);
        }
        Ok(out)
    }

    /// Status distribution within the window.
    pub async fn status_counts(
        coll: &Collection<Document>,
        filter: &FilterState,
    ) -> Result<Vec<StatusBucket>, mongodb::error::Error> {
        Self::aggregate(coll, pipelines::status_counts(filter)).await
    }

    /// Average measured duration; `None` when no job qualifies.
    pub async fn avg_duration(
        coll: &Collection<Document>,
        filter: &FilterState,
        source: DurationSource,
    ) -> Result<Option<AvgDurationRow>, mongodb::error::Error> {
        let rows: Vec<AvgDurationRow> =
            Self::aggregate(coll, pipelines::avg_duration(filter, source)).await?;
        Ok(rows.into_iter().next())
    }

    /// Average positive pending time; `None` when no job qualifies.
    pub async fn avg_pending(
        coll: &Collection<Document>,
        filter: &FilterState,
    ) -> Result<Option<AvgPendingRow>, mongodb::error::Error> {
        let rows: Vec<AvgPendingRow> =
            Self::aggregate(coll, pipelines::avg_pending(filter)).await?;
        Ok(rows.into_iter().next())
    }

    /// Hourly (hour, status) counts, sorted ascending by hour.
    pub async fn hourly_timeline(
        coll: &Collection<Document>,
        filter: &FilterState,
    ) -> Result<Vec<TimelineBucket>, mongodb::error::Error> {
        Self::aggregate(coll, pipelines::hourly_timeline(filter)).await
    }

    /// Root vs cascade failure split.
    pub async fn error_categories(
        coll: &Collection<Document>,
        filter: &FilterState,
    ) -> Result<Vec<ErrorCategoryBucket>, mongodb::error::Error> {
        Self::aggregate(coll, pipelines::error_categorization(filter)).await
    }

    /// Top root-failure causes.
    pub async fn top_root_causes(
        coll: &Collection<Document>,
        filter: &FilterState,
    ) -> Result<Vec<CauseBucket>, mongodb::error::Error> {
        Self::aggregate(coll, pipelines::top_root_causes(filter)).await
    }

    /// Most frequent failed activities.
    pub async fn failed_activities(
        coll: &Collection<Document>,
        filter: &FilterState,
    ) -> Result<Vec<ActivityBucket>, mongodb::error::Error> {
        Self::aggregate(coll, pipelines::failed_activities(filter)).await
    }

    /// Per-(type, status) counts over the window-only predicate.
    pub async fn type_breakdown(
        coll: &Collection<Document>,
        filter: &FilterState,
    ) -> Result<Vec<TypeStatusBucket>, mongodb::error::Error> {
        Self::aggregate(coll, pipelines::type_breakdown(filter)).await
    }

    /// Pending-time aggregates per type.
    pub async fn pending_by_type(
        coll: &Collection<Document>,
        filter: &FilterState,
    ) -> Result<Vec<PendingTypeBucket>, mongodb::error::Error> {
        Self::aggregate(coll, pipelines::pending_by_type(filter)).await
    }

    /// Most recent jobs in the window, newest first, capped at
    /// [`pipelines::RECENT_JOBS_LIMIT`] documents.
    pub async fn recent_jobs(
        coll: &Collection<Document>,
        filter: &FilterState,
    ) -> Result<Vec<JobDocument>, mongodb::error::Error> {
        let mut cursor = coll
            .find(pipelines::base_filter(filter))
            .projection(pipelines::recent_projection())
            .sort(bson::doc! { "createdAt": -1 })
            .limit(pipelines::RECENT_JOBS_LIMIT)
            .await?;
        let mut out = Vec::new();
        while let Some(doc) = cursor.try_next().await? {
            out.push(bson::from_document(doc)?);
        }
        Ok(out)
    }

    /// Failed jobs for export, newest first, capped at
    /// [`pipelines::EXPORT_LIMIT`] documents.
    pub async fn failed_jobs_for_export(
        coll: &Collection<Document>,
        filter: &FilterState,
        omit_cascade: bool,
    ) -> Result<Vec<JobDocument>, mongodb::error::Error> {
        let mut cursor = coll
            .find(pipelines::export_filter(filter, omit_cascade))
            .projection(pipelines::export_projection())
            .sort(bson::doc! { "createdAt": -1 })
            .limit(pipelines::EXPORT_LIMIT)
            .await?;
        let mut out = Vec::new();
        while let Some(doc) = cursor.try_next().await? {
            out.push(bson::from_document(doc)?);
        }
        Ok(out)
    }
}
