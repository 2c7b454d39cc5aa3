use crate::types::Timestamp;

/// Domain-level errors shared across the jobscope crates.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Invalid time range: start {start} is after end {end}")]
    InvalidRange { start: Timestamp, end: Timestamp },

    #[error("Failed to load artifact type catalog: {0}")]
    CatalogLoad(String),

    #[error("Validation failed: {0}")]
    Validation(String),
}
