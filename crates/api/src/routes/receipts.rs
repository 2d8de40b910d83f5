//! Receipt handler.

use axum::{
    extract::{Path, State},
    Json,
};
use domain::models::ReceiptUrlResponse;
use shared::validation::validate_document_id;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::SessionAuth;

/// View URL of a stored receipt.
///
/// GET /api/v1/receipts/:file_id
pub async fn receipt_url(
    State(state): State<AppState>,
    _session: SessionAuth,
    Path(file_id): Path<String>,
) -> Result<Json<ReceiptUrlResponse>, ApiError> {
    validate_document_id(&file_id)
        .map_err(|_| ApiError::Validation("Invalid file id".to_string()))?;

    Ok(Json(ReceiptUrlResponse {
        url: state.files.view_url(&file_id),
        file_id,
    }))
}
