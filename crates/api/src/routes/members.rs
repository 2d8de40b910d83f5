//! Member self-service handlers.

use axum::{extract::State, Json};
use domain::models::{CoffeeReceipt, Member};

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::MemberSession;

/// The member linked to the current session.
///
/// GET /api/v1/members/me
pub async fn get_me(session: MemberSession) -> Json<Member> {
    Json(session.member)
}

/// Register a coffee for the current member.
///
/// POST /api/v1/members/me/coffee
pub async fn register_coffee(
    State(state): State<AppState>,
    session: MemberSession,
) -> Result<Json<CoffeeReceipt>, ApiError> {
    let receipt = state.ledger.register_coffee(&session.member).await?;
    Ok(Json(receipt))
}
