//! Stored job document model and the failed-job export record (PRD-73).

use bson::oid::ObjectId;
use bson::Document;
use serde::{Deserialize, Serialize};

/// A document from the `artifactJobs` collection, as returned by the
/// bounded `find` paths (recent jobs, export). Fields outside the query
/// projection decode as `None`; the collection itself is never mutated.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobDocument {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    #[serde(default)]
    pub status: Option<String>,
    pub created_at: bson::DateTime,
    #[serde(default)]
    pub start_time: Option<bson::DateTime>,
    #[serde(default)]
    pub artifact_type_id: Option<ObjectId>,
    #[serde(default)]
    pub execution: Option<ExecutionInfo>,
    /// Raw error subdocument. Error shapes vary across job types, so this
    /// stays a `Document` until normalization or export converts it.
    #[serde(default)]
    pub error: Option<Document>,
}

impl JobDocument {
    /// Root cause message from the error subdocument, if recorded.
    pub fn root_cause_message(&self) -> Option<&str> {
        self.error.as_ref()?.get_str("rootCauseMessage").ok()
    }
}

/// Execution measurements. The two schema versions in the field disagree on
/// where the duration lives; both fields are optional and the configured
/// duration source picks one.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionInfo {
    #[serde(default)]
    pub total_duration: Option<f64>,
    #[serde(default)]
    pub durations: Option<Vec<f64>>,
}

/// One entry of the failed-jobs export: a bounded projection of a failed
/// job with every identifier and timestamp stringified, serialized as a
/// single JSON array.
#[derive(Debug, Clone, Serialize)]
pub struct ExportRecord {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "createdAt")]
    pub created_at: String,
    pub status: Option<String>,
    #[serde(rename = "artifactTypeId")]
    pub artifact_type_id: String,
    #[serde(rename = "artifactTypeName")]
    pub artifact_type_name: String,
    pub error: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use bson::doc;

    use super::*;

    #[test]
    fn decodes_a_full_document() {
        let id = ObjectId::new();
        let type_id = ObjectId::new();
        let doc = doc! {
            "_id": id,
            "status": "failed",
            "createdAt": bson::DateTime::now(),
            "startTime": bson::DateTime::now(),
            "artifactTypeId": type_id,
            "execution": { "totalDuration": 12.5, "durations": [12.5] },
            "error": {
                "name": "ActivityError",
                "rootCauseMessage": "disk full",
                "failedActivity": { "name": "render" },
            },
        };
        let job: JobDocument = bson::from_document(doc).unwrap();
        assert_eq!(job.id, id);
        assert_eq!(job.status.as_deref(), Some("failed"));
        assert_eq!(job.artifact_type_id, Some(type_id));
        assert_eq!(job.root_cause_message(), Some("disk full"));
        assert_eq!(job.execution.unwrap().total_duration, Some(12.5));
    }

    #[test]
    fn decodes_a_projected_document() {
        // Recent-jobs projection: only status/createdAt/artifactTypeId and
        // the error message survive the projection.
        let doc = doc! {
            "_id": ObjectId::new(),
            "status": "completed",
            "createdAt": bson::DateTime::now(),
            "artifactTypeId": ObjectId::new(),
        };
        let job: JobDocument = bson::from_document(doc).unwrap();
        assert!(job.start_time.is_none());
        assert!(job.execution.is_none());
        assert!(job.error.is_none());
        assert!(job.root_cause_message().is_none());
    }

    #[test]
    fn tolerates_missing_status_and_type() {
        let doc = doc! {
            "_id": ObjectId::new(),
            "createdAt": bson::DateTime::now(),
        };
        let job: JobDocument = bson::from_document(doc).unwrap();
        assert!(job.status.is_none());
        assert!(job.artifact_type_id.is_none());
    }
}
