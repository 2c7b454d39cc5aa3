//! Handlers for the dashboard snapshot and recent-jobs endpoints (PRD-73).
//!
//! Each request is one render cycle: the filter is rebuilt from the query
//! parameters with `now` captured once, every pipeline runs against that
//! single window, and a database failure resets the connection handle so
//! the next cycle re-attempts.

use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use jobscope_core::catalog::TypeCatalog;
use jobscope_core::filter::{FilterState, TimeSelection, TypeSelection};
use jobscope_core::types::Timestamp;
use jobscope_db::snapshot;
use serde::Deserialize;

use crate::config::ServerConfig;
use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Query parameter types
// ---------------------------------------------------------------------------

/// Common dashboard filter parameters.
///
/// `from`/`to` (RFC 3339) select an explicit range and take precedence over
/// `range`; otherwise `range` picks a preset, defaulting to the last 24
/// hours. `type_id` narrows to one artifact type; absent means all types.
#[derive(Debug, Default, Deserialize)]
pub struct DashboardQuery {
    pub range: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub type_id: Option<String>,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn parse_ts(value: &str, field: &str) -> AppResult<Timestamp> {
    value
        .parse::<Timestamp>()
        .map_err(|_| AppError::BadRequest(format!("Invalid '{field}' date format")))
}

/// Build the render cycle's filter from query parameters.
///
/// `now` is passed in by the caller so every pipeline in the cycle (and
/// any test) observes the same instant.
pub fn build_filter(
    params: &DashboardQuery,
    catalog: &TypeCatalog,
    now: Timestamp,
) -> AppResult<FilterState> {
    let time = match (&params.from, &params.to) {
        (Some(from), Some(to)) => TimeSelection::Custom {
            from: parse_ts(from, "from")?,
            to: parse_ts(to, "to")?,
        },
        (Some(_), None) | (None, Some(_)) => {
            return Err(AppError::BadRequest(
                "Custom ranges need both 'from' and 'to'".into(),
            ));
        }
        (None, None) => {
            TimeSelection::from_str(params.range.as_deref().unwrap_or("24h"))
        }
    };

    let types = match &params.type_id {
        Some(id) => TypeSelection::One(id.clone()),
        None => TypeSelection::All,
    };

    Ok(FilterState::build(time, &types, now, catalog)?)
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// GET /api/v1/dashboard
///
/// Run the full aggregation plan for the filtered window and return the
/// snapshot (or the empty display state).
pub async fn get_dashboard(
    State(state): State<AppState>,
    Query(params): Query<DashboardQuery>,
) -> AppResult<impl IntoResponse> {
    let filter = build_filter(&params, &state.catalog, Utc::now())?;
    let coll = state
        .mongo
        .collection(&state.config.database_name(), ServerConfig::COLLECTION)
        .await?;

    match snapshot::build_snapshot(
        &coll,
        &filter,
        &state.catalog,
        state.config.duration_source,
    )
    .await
    {
        Ok(snap) => Ok(Json(DataResponse { data: snap })),
        Err(err) => {
            // Abort the cycle and reset so the next action reconnects.
            state.mongo.disconnect().await;
            Err(err.into())
        }
    }
}

// ---------------------------------------------------------------------------
// Recent jobs
// ---------------------------------------------------------------------------

/// GET /api/v1/dashboard/recent
///
/// The 50 most recent jobs in the window, newest first.
pub async fn get_recent_jobs(
    State(state): State<AppState>,
    Query(params): Query<DashboardQuery>,
) -> AppResult<impl IntoResponse> {
    let filter = build_filter(&params, &state.catalog, Utc::now())?;
    let coll = state
        .mongo
        .collection(&state.config.database_name(), ServerConfig::COLLECTION)
        .await?;

    match snapshot::recent_jobs(&coll, &filter, &state.catalog).await {
        Ok(rows) => Ok(Json(DataResponse { data: rows })),
        Err(err) => {
            state.mongo.disconnect().await;
            Err(err.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::{Duration, TimeZone, Utc};
    use jobscope_core::error::CoreError;

    use super::*;

    fn catalog() -> TypeCatalog {
        let mut m = std::collections::BTreeMap::new();
        m.insert("64a000000000000000000001".to_string(), "Render".to_string());
        m.insert("64a000000000000000000002".to_string(), "Encode".to_string());
        TypeCatalog::from_map(m)
    }

    fn now() -> Timestamp {
        Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap()
    }

    #[test]
    fn defaults_to_last_24_hours_all_types() {
        let filter = build_filter(&DashboardQuery::default(), &catalog(), now()).unwrap();
        assert_eq!(filter.time_end, now());
        assert_eq!(filter.time_end - filter.time_start, Duration::hours(24));
        assert_eq!(filter.type_ids.len(), 2);
    }

    #[test]
    fn preset_range_is_honored() {
        let params = DashboardQuery {
            range: Some("6h".into()),
            ..Default::default()
        };
        let filter = build_filter(&params, &catalog(), now()).unwrap();
        assert_eq!(filter.time_end - filter.time_start, Duration::hours(6));
    }

    #[test]
    fn explicit_range_takes_precedence_over_preset() {
        let params = DashboardQuery {
            range: Some("6h".into()),
            from: Some("2025-06-10T00:00:00Z".into()),
            to: Some("2025-06-12T00:00:00Z".into()),
            ..Default::default()
        };
        let filter = build_filter(&params, &catalog(), now()).unwrap();
        assert_eq!(filter.time_end - filter.time_start, Duration::days(2));
    }

    #[test]
    fn half_open_custom_range_is_rejected() {
        let params = DashboardQuery {
            from: Some("2025-06-10T00:00:00Z".into()),
            ..Default::default()
        };
        assert_matches!(
            build_filter(&params, &catalog(), now()),
            Err(AppError::BadRequest(_))
        );
    }

    #[test]
    fn unparsable_date_is_a_bad_request() {
        let params = DashboardQuery {
            from: Some("June 10th".into()),
            to: Some("2025-06-12T00:00:00Z".into()),
            ..Default::default()
        };
        assert_matches!(
            build_filter(&params, &catalog(), now()),
            Err(AppError::BadRequest(_))
        );
    }

    #[test]
    fn inverted_range_surfaces_invalid_range() {
        let params = DashboardQuery {
            from: Some("2025-06-12T00:00:00Z".into()),
            to: Some("2025-06-10T00:00:00Z".into()),
            ..Default::default()
        };
        assert_matches!(
            build_filter(&params, &catalog(), now()),
            Err(AppError::Core(CoreError::InvalidRange { .. }))
        );
    }

    #[test]
    fn type_id_narrows_the_selection() {
        let params = DashboardQuery {
            type_id: Some("64a000000000000000000002".into()),
            ..Default::default()
        };
        let filter = build_filter(&params, &catalog(), now()).unwrap();
        assert_eq!(filter.type_ids, vec!["64a000000000000000000002".to_string()]);
    }
}
