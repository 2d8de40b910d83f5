//! Ledger log handlers.

use axum::{extract::State, Json};
use domain::models::LogEntry;
use serde::Serialize;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::SessionAuth;

/// Entries returned by the log feeds.
pub const LOG_FEED_LEN: usize = 10;

#[derive(Debug, Serialize)]
pub struct LogsResponse {
    pub logs: Vec<LogEntry>,
}

/// GET /api/v1/logs
pub async fn recent_logs(
    State(state): State<AppState>,
    _session: SessionAuth,
) -> Result<Json<LogsResponse>, ApiError> {
    let logs = state.repos.logs.recent(LOG_FEED_LEN).await?;
    Ok(Json(LogsResponse { logs }))
}

/// Latest expenses and bean purchases.
///
/// GET /api/v1/logs/group
pub async fn group_logs(
    State(state): State<AppState>,
    _session: SessionAuth,
) -> Result<Json<LogsResponse>, ApiError> {
    let logs = state
        .repos
        .logs
        .recent_group_purchases(LOG_FEED_LEN)
        .await?;
    Ok(Json(LogsResponse { logs }))
}
