//! MongoDB access layer for the artifact jobs monitoring service.
//!
//! Strictly read-only against the `artifactJobs` collection: the planner in
//! [`pipelines`] describes aggregations, [`repositories`] executes them and
//! decodes the raw buckets into typed models, [`normalize`] reshapes those
//! into display records, and [`snapshot`] runs one full render cycle.

pub mod export;
pub mod handle;
pub mod models;
pub mod normalize;
pub mod pipelines;
pub mod repositories;
pub mod snapshot;

pub use handle::MongoHandle;

/// Errors from the connection handle and render-cycle entry points.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// No client established yet, or the handle was reset after a failure.
    #[error("Not connected to MongoDB")]
    NotConnected,

    /// Any driver-reported error (connection, query, decode).
    #[error(transparent)]
    Mongo(#[from] mongodb::error::Error),
}
