//! Admin endpoint handlers.
//!
//! Every handler takes [`AdminSession`], so non-admins get 403 before the
//! body is read.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use domain::models::{
    AdminOverview, BeanPurchaseRequest, BeanPurchaseResult, CreateMemberRequest, ExpenseRequest,
    GlobalConfig, LedgerResult, Member, TopUpRequest, UpdateGramsPerCupRequest,
    UpdateSurchargeRequest,
};

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::AdminSession;

/// All members and the group pot.
///
/// GET /api/v1/admin/members
pub async fn list_members(
    State(state): State<AppState>,
    _admin: AdminSession,
) -> Result<Json<AdminOverview>, ApiError> {
    Ok(Json(state.ledger.overview().await?))
}

/// POST /api/v1/admin/members
pub async fn create_member(
    State(state): State<AppState>,
    _admin: AdminSession,
    Json(request): Json<CreateMemberRequest>,
) -> Result<(StatusCode, Json<Member>), ApiError> {
    let member = state.ledger.create_member(&request).await?;
    Ok((StatusCode::CREATED, Json(member)))
}

/// POST /api/v1/admin/members/:member_id/top-ups
pub async fn top_up(
    State(state): State<AppState>,
    _admin: AdminSession,
    Path(member_id): Path<String>,
    Json(request): Json<TopUpRequest>,
) -> Result<(StatusCode, Json<LedgerResult>), ApiError> {
    let result = state.ledger.top_up(&member_id, &request).await?;
    Ok((StatusCode::CREATED, Json(result)))
}

/// POST /api/v1/admin/expenses
pub async fn record_expense(
    State(state): State<AppState>,
    _admin: AdminSession,
    Json(request): Json<ExpenseRequest>,
) -> Result<(StatusCode, Json<LedgerResult>), ApiError> {
    let result = state.ledger.record_expense(&request).await?;
    Ok((StatusCode::CREATED, Json(result)))
}

/// POST /api/v1/admin/bean-purchases
pub async fn record_bean_purchase(
    State(state): State<AppState>,
    _admin: AdminSession,
    Json(request): Json<BeanPurchaseRequest>,
) -> Result<(StatusCode, Json<BeanPurchaseResult>), ApiError> {
    let result = state.ledger.record_bean_purchase(&request).await?;
    Ok((StatusCode::CREATED, Json(result)))
}

/// PUT /api/v1/admin/config/grams-per-cup
pub async fn update_grams_per_cup(
    State(state): State<AppState>,
    _admin: AdminSession,
    Json(request): Json<UpdateGramsPerCupRequest>,
) -> Result<Json<GlobalConfig>, ApiError> {
    Ok(Json(state.ledger.update_grams_per_cup(&request).await?))
}

/// PUT /api/v1/admin/config/surcharge
pub async fn update_surcharge(
    State(state): State<AppState>,
    _admin: AdminSession,
    Json(request): Json<UpdateSurchargeRequest>,
) -> Result<Json<GlobalConfig>, ApiError> {
    Ok(Json(state.ledger.update_surcharge(&request).await?))
}
