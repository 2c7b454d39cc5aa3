//! Periodic dashboard auto-refresh (PRD-75).
//!
//! Re-invokes the same render-cycle function the HTTP handlers use, on a
//! fixed interval, with the default filter (last 24 hours, all types).
//! Each tick rebuilds its [`FilterState`] from a fresh `now`, so the task
//! keeps the snapshot warm without sharing any mutable state with the
//! request path. Runs until cancelled; failures are logged and the next
//! tick re-attempts.

use std::time::Duration;

use chrono::Utc;
use jobscope_core::filter::{FilterState, TimeSelection, TypeSelection};
use jobscope_db::models::dashboard::Snapshot;
use jobscope_db::snapshot::build_snapshot;
use tokio_util::sync::CancellationToken;

use crate::config::ServerConfig;
use crate::state::AppState;

/// Run the auto-refresh loop.
pub async fn run(state: AppState, cancel: CancellationToken) {
    let interval_secs = state.config.refresh_interval_secs;
    if interval_secs == 0 {
        tracing::debug!("Auto-refresh disabled");
        return;
    }

    tracing::info!(interval_secs, "Auto-refresh started");
    let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Auto-refresh stopping");
                break;
            }
            _ = interval.tick() => {
                tick(&state).await;
            }
        }
    }
}

/// One refresh cycle. Never fatal: a disconnected handle or a failed
/// query leaves the dashboard interactive and re-attempts next tick.
async fn tick(state: &AppState) {
    if !state.mongo.is_connected().await {
        tracing::debug!("Auto-refresh skipped: not connected");
        return;
    }

    let filter = match FilterState::build(
        TimeSelection::Last24Hours,
        &TypeSelection::All,
        Utc::now(),
        &state.catalog,
    ) {
        Ok(filter) => filter,
        Err(err) => {
            tracing::error!(error = %err, "Auto-refresh filter build failed");
            return;
        }
    };

    let coll = match state
        .mongo
        .collection(&state.config.database_name(), ServerConfig::COLLECTION)
        .await
    {
        Ok(coll) => coll,
        Err(err) => {
            tracing::debug!(error = %err, "Auto-refresh skipped");
            return;
        }
    };

    match build_snapshot(&coll, &filter, &state.catalog, state.config.duration_source).await {
        Ok(Snapshot::Ready(snap)) => {
            tracing::info!(
                total = snap.total_jobs,
                failed = snap.failed,
                health_pct = snap.health_pct,
                "Auto-refresh cycle complete",
            );
        }
        Ok(Snapshot::Empty { .. }) => {
            tracing::info!("Auto-refresh cycle complete: no jobs in window");
        }
        Err(err) => {
            // Reset so the next user action (or tick) reconnects cleanly.
            tracing::error!(error = %err, "Auto-refresh cycle failed");
            state.mongo.disconnect().await;
        }
    }
}
