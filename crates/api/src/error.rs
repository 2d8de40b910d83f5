use axum::{
    extract::rejection::JsonRejection,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use domain::services::IdentityError;
use persistence::store::StoreError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("missing token")]
    MissingToken,

    #[error("invalid token")]
    InvalidToken,

    #[error("token expired")]
    TokenExpired,

    #[error("no linked user")]
    NoLinkedUser,

    /// Failure surfaced with its underlying message.
    #[error("server error: {0}")]
    Server(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Rate limited")]
    RateLimited { retry_after_secs: u64 },

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),
}

/// Error body on the wire.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, details) = match &self {
            ApiError::MissingToken => (StatusCode::BAD_REQUEST, "missing token", None),
            ApiError::InvalidToken => (StatusCode::BAD_REQUEST, "invalid token", None),
            ApiError::TokenExpired => (StatusCode::BAD_REQUEST, "token expired", None),
            ApiError::NoLinkedUser => (StatusCode::BAD_REQUEST, "no linked user", None),
            ApiError::Server(msg) => {
                tracing::error!("Server error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "server error",
                    Some(msg.clone()),
                )
            }
            ApiError::Unauthorized(msg) => {
                (StatusCode::UNAUTHORIZED, "unauthorized", Some(msg.clone()))
            }
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", Some(msg.clone())),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not found", Some(msg.clone())),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", Some(msg.clone())),
            ApiError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                "validation error",
                Some(msg.clone()),
            ),
            ApiError::RateLimited { .. } => (
                StatusCode::TOO_MANY_REQUESTS,
                "rate limited",
                Some("Too many requests. Please try again later.".to_string()),
            ),
            ApiError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "internal error", None)
            }
            ApiError::ServiceUnavailable(msg) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "service unavailable",
                Some(msg.clone()),
            ),
        };

        let body = ErrorBody {
            error: error.to_string(),
            details,
        };

        let mut response = (status, Json(body)).into_response();
        if let ApiError::RateLimited { retry_after_secs } = self {
            if let Ok(value) = HeaderValue::from_str(&retry_after_secs.to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
        }
        response
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => ApiError::NotFound("Resource not found".into()),
            StoreError::Conflict => ApiError::Conflict("Resource already exists".into()),
            other => ApiError::Internal(format!("Store error: {}", other)),
        }
    }
}

impl From<IdentityError> for ApiError {
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::InvalidSession => {
                ApiError::Unauthorized("Invalid or expired session".into())
            }
            IdentityError::UnknownUser(uid) => ApiError::Unauthorized(format!("Unknown user: {}", uid)),
            IdentityError::Unavailable(msg) => ApiError::ServiceUnavailable(msg),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut messages: Vec<String> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |e| {
                    e.message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("{} is invalid", field))
                })
            })
            .collect();
        messages.sort();

        if messages.is_empty() {
            // Nested struct errors carry no top-level field messages.
            return ApiError::Validation(errors.to_string());
        }
        ApiError::Validation(messages.join("; "))
    }
}
