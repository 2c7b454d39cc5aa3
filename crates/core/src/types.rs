/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Artifact type identifiers are opaque 24-character hex strings
/// (stringified ObjectIds). The core never interprets them beyond
/// equality and catalog lookup.
pub type TypeId = String;
