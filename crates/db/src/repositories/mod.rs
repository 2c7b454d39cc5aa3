//! Repository layer.
//!
//! A zero-sized struct providing async query methods that accept the jobs
//! `&Collection<Document>` as the first argument. Read-only: no method
//! writes to the collection.

pub mod job_stats_repo;

pub use job_stats_repo::JobStatsRepo;
