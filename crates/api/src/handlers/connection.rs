//! Handlers for explicit connection lifecycle management (PRD-72).
//!
//! The connection is never established implicitly: the client connects by
//! action, the handle is reused across render cycles, and a failed cycle
//! resets it so the next connect re-attempts.

use std::time::Duration;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// Connection state reported to the client.
#[derive(Debug, Serialize)]
pub struct ConnectionStatus {
    pub connected: bool,
    pub environment: &'static str,
    pub database: String,
}

async fn current_status(state: &AppState) -> ConnectionStatus {
    ConnectionStatus {
        connected: state.mongo.is_connected().await,
        environment: state.config.environment.as_str(),
        database: state.config.database_name(),
    }
}

/// POST /api/v1/connection/connect
///
/// Establish (or re-establish) the MongoDB client for the configured
/// environment, verifying it with a server round-trip before reporting
/// success.
pub async fn connect(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let uri = state.config.mongo_uri().ok_or_else(|| {
        AppError::BadRequest(format!(
            "No MongoDB URI configured for the {} environment",
            state.config.environment.as_str()
        ))
    })?;

    state
        .mongo
        .connect(uri, Duration::from_secs(state.config.connect_timeout_secs))
        .await?;

    Ok(Json(DataResponse {
        data: current_status(&state).await,
    }))
}

/// POST /api/v1/connection/disconnect
pub async fn disconnect(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    state.mongo.disconnect().await;
    Ok(Json(DataResponse {
        data: current_status(&state).await,
    }))
}

/// GET /api/v1/connection/status
pub async fn status(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    Ok(Json(DataResponse {
        data: current_status(&state).await,
    }))
}
