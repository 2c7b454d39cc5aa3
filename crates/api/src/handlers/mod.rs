//! HTTP handlers, grouped by resource.

pub mod connection;
pub mod dashboard;
pub mod export;
pub mod health;
