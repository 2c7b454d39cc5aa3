use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    /// Whether the MongoDB handle currently holds a verified client.
    mongo_connected: bool,
}

/// Liveness probe. Always 200; a missing database connection is reported
/// in the body, not as a failure, since the service stays interactive
/// without one.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        mongo_connected: state.mongo.is_connected().await,
    })
}

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
