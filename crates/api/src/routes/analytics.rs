//! Analytics handler.

use axum::{extract::State, Json};
use chrono::Utc;
use domain::models::AnalyticsResponse;
use domain::services::build_analytics;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::MemberSession;

/// Logs the analytics are computed over.
pub const ANALYTICS_LOG_WINDOW: usize = 100;

/// GET /api/v1/analytics
pub async fn get_analytics(
    State(state): State<AppState>,
    session: MemberSession,
) -> Result<Json<AnalyticsResponse>, ApiError> {
    let members = state.repos.members.list().await?;
    let logs = state.repos.logs.recent(ANALYTICS_LOG_WINDOW).await?;

    Ok(Json(build_analytics(
        &session.member,
        &members,
        &logs,
        Utc::now(),
    )))
}
