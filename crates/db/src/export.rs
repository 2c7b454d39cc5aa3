//! Failed-jobs export serializer (PRD-74).
//!
//! Projects a bounded set of failed jobs into portable JSON records:
//! identifiers and timestamps stringified, the error subdocument converted
//! field-by-field, and the root cause message truncated to the export
//! limit. Output is a single document array, not newline-delimited records.

use bson::{Bson, Document};
use chrono::SecondsFormat;
use jobscope_core::catalog::TypeCatalog;
use jobscope_core::filter::FilterState;
use jobscope_core::rollup::truncate_chars;
use jobscope_core::types::Timestamp;
use mongodb::Collection;

use crate::models::job::{ExportRecord, JobDocument};
use crate::repositories::JobStatsRepo;

/// Character cap applied to `rootCauseMessage` before serialization.
/// Independent of the 60-char display truncation and the query-side
/// 100-byte grouping prefix.
pub const EXPORT_MESSAGE_CHARS: usize = 200;

/// Fetch and serialize the failed jobs matching `filter`.
///
/// At most [`crate::pipelines::EXPORT_LIMIT`] records, newest first.
pub async fn export_failed_jobs(
    coll: &Collection<Document>,
    filter: &FilterState,
    omit_cascade: bool,
    catalog: &TypeCatalog,
) -> Result<Vec<ExportRecord>, mongodb::error::Error> {
    let jobs = JobStatsRepo::failed_jobs_for_export(coll, filter, omit_cascade).await?;
    tracing::debug!(records = jobs.len(), omit_cascade, "Export assembled");
    Ok(jobs
        .into_iter()
        .map(|job| to_export_record(job, catalog))
        .collect())
}

/// Stamped download filename for an export taken at `at`.
pub fn export_filename(at: Timestamp) -> String {
    format!("failed_jobs_{}.json", at.format("%Y%m%d_%H%M%S"))
}

/// Project one job document into its export record.
fn to_export_record(job: JobDocument, catalog: &TypeCatalog) -> ExportRecord {
    let type_id = job
        .artifact_type_id
        .map(|o| o.to_hex())
        .unwrap_or_default();
    let error = match job.error {
        Some(mut doc) => {
            if let Ok(msg) = doc.get_str("rootCauseMessage") {
                let truncated = truncate_chars(msg, EXPORT_MESSAGE_CHARS);
                doc.insert("rootCauseMessage", truncated);
            }
            display_json(Bson::Document(doc))
        }
        None => serde_json::Value::Object(serde_json::Map::new()),
    };
    ExportRecord {
        id: job.id.to_hex(),
        created_at: job
            .created_at
            .to_chrono()
            .to_rfc3339_opts(SecondsFormat::Millis, true),
        status: job.status,
        artifact_type_name: catalog.resolve(&type_id),
        artifact_type_id: type_id,
        error,
    }
}

/// Convert a BSON value to portable JSON, stringifying anything that has
/// no native JSON form (timestamps, ObjectIds).
fn display_json(value: Bson) -> serde_json::Value {
    match value {
        Bson::Document(doc) => serde_json::Value::Object(
            doc.into_iter()
                .map(|(k, v)| (k, display_json(v)))
                .collect(),
        ),
        Bson::Array(items) => {
            serde_json::Value::Array(items.into_iter().map(display_json).collect())
        }
        Bson::String(s) => serde_json::Value::String(s),
        Bson::Boolean(b) => serde_json::Value::Bool(b),
        Bson::Int32(n) => serde_json::Value::from(n),
        Bson::Int64(n) => serde_json::Value::from(n),
        Bson::Double(n) => serde_json::Value::from(n),
        Bson::Null => serde_json::Value::Null,
        Bson::ObjectId(oid) => serde_json::Value::String(oid.to_hex()),
        Bson::DateTime(dt) => serde_json::Value::String(
            dt.to_chrono().to_rfc3339_opts(SecondsFormat::Millis, true),
        ),
        other => serde_json::Value::String(other.to_string()),
    }
}
