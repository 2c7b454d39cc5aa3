//! Job status classification.
//!
//! The collection stores status as a free-form string; anything outside the
//! known set (or a missing value) folds to [`JobStatus::Unknown`] at the
//! normalization boundary.

use serde::{Deserialize, Serialize};

/// Error name recorded on a failure caused by a child workflow failing,
/// as opposed to an original ("root") failure. Used to split the error
/// analysis into cascade vs root buckets.
pub const CASCADE_ERROR_NAME: &str = "ChildWorkflowFailure";

/// Execution status of an artifact job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Completed,
    Failed,
    Running,
    Unknown,
}

impl JobStatus {
    /// String representation matching the stored collection values.
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
            JobStatus::Running => "running",
            JobStatus::Unknown => "unknown",
        }
    }

    /// Parse from a stored string, folding unknown values to `Unknown`.
    pub fn from_str(s: &str) -> Self {
        match s {
            "completed" => JobStatus::Completed,
            "failed" => JobStatus::Failed,
            "running" => JobStatus::Running,
            _ => JobStatus::Unknown,
        }
    }

    /// Parse an optional stored value. Missing and empty strings both fold
    /// to `Unknown`, matching the grouping-key fallback rule.
    pub fn from_stored(s: Option<&str>) -> Self {
        match s {
            Some(v) if !v.is_empty() => JobStatus::from_str(v),
            _ => JobStatus::Unknown,
        }
    }
}

/// Normalize an optional grouping key to its display form.
///
/// Aggregation group keys for status can come back missing or empty when
/// the underlying field is absent; both cases render as `"unknown"`.
pub fn status_key(key: Option<&str>) -> String {
    JobStatus::from_stored(key).as_str().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_statuses_round_trip() {
        for s in ["completed", "failed", "running"] {
            assert_eq!(JobStatus::from_str(s).as_str(), s);
        }
    }

    #[test]
    fn unexpected_value_folds_to_unknown() {
        assert_eq!(JobStatus::from_str("cancelled"), JobStatus::Unknown);
        assert_eq!(JobStatus::from_str(""), JobStatus::Unknown);
    }

    #[test]
    fn missing_and_empty_keys_render_unknown() {
        assert_eq!(status_key(None), "unknown");
        assert_eq!(status_key(Some("")), "unknown");
        assert_eq!(status_key(Some("failed")), "failed");
    }
}
