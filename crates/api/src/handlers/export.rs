//! Handler for the failed-jobs export download (PRD-74).

use axum::extract::{Query, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use jobscope_db::export;
use serde::Deserialize;

use crate::config::ServerConfig;
use crate::error::AppResult;
use crate::handlers::dashboard::{build_filter, DashboardQuery};
use crate::state::AppState;

/// Export parameters: the dashboard filter plus the cascade switch.
#[derive(Debug, Deserialize)]
pub struct ExportQuery {
    pub range: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub type_id: Option<String>,
    /// Exclude cascading child-workflow failures. Defaults to true.
    pub omit_cascade: Option<bool>,
}

/// GET /api/v1/dashboard/export
///
/// Failed jobs in the window as a single JSON array, served as an
/// attachment with the filename stamped from the export timestamp.
pub async fn export_failed_jobs(
    State(state): State<AppState>,
    Query(params): Query<ExportQuery>,
) -> AppResult<impl IntoResponse> {
    let now = Utc::now();
    let filter_params = DashboardQuery {
        range: params.range,
        from: params.from,
        to: params.to,
        type_id: params.type_id,
    };
    let filter = build_filter(&filter_params, &state.catalog, now)?;
    let omit_cascade = params.omit_cascade.unwrap_or(true);
    let coll = state
        .mongo
        .collection(&state.config.database_name(), ServerConfig::COLLECTION)
        .await?;

    match export::export_failed_jobs(&coll, &filter, omit_cascade, &state.catalog).await {
        Ok(records) => {
            let filename = export::export_filename(now);
            tracing::info!(records = records.len(), %filename, "Export served");
            Ok((
                [(
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{filename}\""),
                )],
                Json(records),
            ))
        }
        Err(err) => {
            state.mongo.disconnect().await;
            Err(err.into())
        }
    }
}
