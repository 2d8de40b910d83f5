//! Global configuration handler.

use axum::{extract::State, Json};
use domain::models::GlobalConfig;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::SessionAuth;

/// Current pricing and pot; defaults when the singleton does not exist yet.
///
/// GET /api/v1/config
pub async fn get_config(
    State(state): State<AppState>,
    _session: SessionAuth,
) -> Result<Json<GlobalConfig>, ApiError> {
    Ok(Json(state.repos.global_config.get().await?))
}
