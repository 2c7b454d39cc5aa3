//! Document models and display records.
//!
//! Raw aggregation buckets are decoded into the typed structs in
//! [`dashboard`] immediately at the repository boundary; untyped documents
//! never travel past the normalizer.

pub mod dashboard;
pub mod job;
