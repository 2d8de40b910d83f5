//! Claim endpoint handlers.

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use domain::models::{ClaimExchangeRequest, ClaimExchangeResponse, CreateClaimResponse};

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::AdminSession;

/// Exchange a claim token for a session credential.
///
/// The body is read as JSON whatever its content type; an empty body carries
/// no token.
///
/// POST /api/v1/claims/exchange
pub async fn exchange_claim(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<ClaimExchangeResponse>, ApiError> {
    let request = parse_exchange_request(&body)?;
    let response = state.claims.exchange(&request, Utc::now()).await?;
    Ok(Json(response))
}

/// Issue a claim for a member; the QR code encodes `claimUrl`.
///
/// POST /api/v1/admin/members/:member_id/claims
pub async fn issue_claim(
    State(state): State<AppState>,
    AdminSession(admin): AdminSession,
    Path(member_id): Path<String>,
) -> Result<(StatusCode, Json<CreateClaimResponse>), ApiError> {
    tracing::debug!(admin = %admin.id, member_id = %member_id, "Issuing claim");
    let response = state.claims.issue(&member_id, Utc::now()).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

fn parse_exchange_request(body: &[u8]) -> Result<ClaimExchangeRequest, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(ApiError::MissingToken);
    }
    let Json(request) = Json::<ClaimExchangeRequest>::from_bytes(body)?;
    Ok(request)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_body_is_missing_token() {
        assert!(matches!(parse_exchange_request(b""), Err(ApiError::MissingToken)));
        assert!(matches!(parse_exchange_request(b" \n"), Err(ApiError::MissingToken)));
    }

    #[test]
    fn test_body_parsed_as_json() {
        let request = parse_exchange_request(br#"{"token":"T1","scannerUid":"U1"}"#).unwrap();
        assert_eq!(request.token(), Some("T1"));
        assert_eq!(request.scanner_uid(), Some("U1"));

        assert!(matches!(
            parse_exchange_request(b"token=T1"),
            Err(ApiError::Validation(_))
        ));
    }
}
