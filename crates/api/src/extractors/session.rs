//! Session extractors.
//!
//! The identity-provider JWT arrives in `X-Appwrite-JWT` or as a Bearer
//! token. The resolved user is cached in request extensions so stacked
//! extractors resolve it once.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};
use domain::models::Member;
use domain::services::SessionUser;
use persistence::appwrite::JWT_HEADER;

use crate::app::AppState;
use crate::error::ApiError;

/// Session token from the request headers, if any.
pub fn session_token(headers: &HeaderMap) -> Option<&str> {
    let from_jwt_header = headers
        .get(JWT_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty());

    from_jwt_header.or_else(|| {
        headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|v| !v.is_empty())
    })
}

/// Any authenticated user.
#[derive(Debug, Clone)]
pub struct SessionAuth(pub SessionUser);

#[async_trait]
impl FromRequestParts<AppState> for SessionAuth {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<SessionUser>() {
            return Ok(SessionAuth(user.clone()));
        }

        let token = session_token(&parts.headers)
            .ok_or_else(|| ApiError::Unauthorized("Missing session token".to_string()))?;
        let user = state.identity.resolve_session(token).await?;

        parts.extensions.insert(user.clone());
        Ok(SessionAuth(user))
    }
}

/// An authenticated user together with the member linked to them.
#[derive(Debug, Clone)]
pub struct MemberSession {
    pub user: SessionUser,
    pub member: Member,
}

#[async_trait]
impl FromRequestParts<AppState> for MemberSession {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let SessionAuth(user) = SessionAuth::from_request_parts(parts, state).await?;
        let member = state
            .repos
            .members
            .find_by_appwrite_uid(&user.id)
            .await?
            .ok_or_else(|| ApiError::NotFound("No member is linked to this session".to_string()))?;

        Ok(MemberSession { user, member })
    }
}

/// An authenticated user carrying the admin label.
#[derive(Debug, Clone)]
pub struct AdminSession(pub SessionUser);

#[async_trait]
impl FromRequestParts<AppState> for AdminSession {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let SessionAuth(user) = SessionAuth::from_request_parts(parts, state).await?;
        if !user.has_label(&state.config.identity.admin_label) {
            tracing::warn!(user_id = %user.id, "Admin route called without admin label");
            return Err(ApiError::Forbidden("Admin access required".to_string()));
        }
        Ok(AdminSession(user))
    }
}
