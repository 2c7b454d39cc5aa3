//! Shared response envelope types for API handlers.
//!
//! Dashboard responses use a `{ "data": ... }` envelope per project
//! conventions. The export endpoint is the one exception: it returns the
//! bare record array so the downloaded file is directly consumable.

use serde::Serialize;

/// Standard `{ "data": T }` response envelope.
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}
