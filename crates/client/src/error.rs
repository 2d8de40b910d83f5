//! Client error types.
//!
//! Transport failures, non-success responses and the poll timeout are kept
//! apart so callers can tell "the server said no" from "we never heard back".

use std::time::Duration;

use reqwest::Response;
use serde::Deserialize;
use thiserror::Error;

/// Result type alias for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;

#[derive(Debug, Error)]
pub enum ClientError {
    /// Invalid client configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Request could not be sent or the response could not be read.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success status with the server's error message.
    #[error("Request failed with status {status}: {message}")]
    Status { status: u16, message: String },

    /// Response body did not match the expected shape.
    #[error("Invalid response: {0}")]
    Decode(#[from] serde_json::Error),

    /// The hosted function ran but did not complete.
    #[error("Execution {execution_id} failed: {message}")]
    ExecutionFailed {
        execution_id: String,
        message: String,
    },

    /// No result arrived within the allotted time.
    ///
    /// The claim may or may not have been consumed.
    #[error("Timed out after {0:?} waiting for the claim exchange")]
    Timeout(Duration),

    /// A claim exchange call needs a token.
    #[error("missing token")]
    MissingToken,
}

impl ClientError {
    /// Whether the outcome of the remote operation is unknown.
    pub fn is_ambiguous(&self) -> bool {
        matches!(self, Self::Timeout(_)) || matches!(self, Self::Http(e) if e.is_timeout())
    }

    /// HTTP status carried by the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// Error body from either the API (`error`) or Appwrite (`message`).
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default, alias = "message")]
    error: String,
}

/// Extract the error message from a response body, if it has one.
pub(crate) fn error_message(body: &[u8]) -> String {
    serde_json::from_slice::<ErrorBody>(body)
        .map(|b| b.error)
        .unwrap_or_default()
}

/// Map non-success statuses to `ClientError::Status`.
pub(crate) async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.bytes().await.unwrap_or_default();
    Err(ClientError::Status {
        status: status.as_u16(),
        message: error_message(&body),
    })
}
