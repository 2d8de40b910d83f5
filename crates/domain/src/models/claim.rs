//! Claim token domain model.
//!
//! A claim is a single-use document whose id is the token printed in the QR
//! code. Exchanging it links the scanning device to a member and yields a
//! session credential for the member's canonical identity.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Lifetime of a freshly issued claim.
pub const CLAIM_TTL_SECS: i64 = 300;

/// Query parameter carrying the token in claim links.
pub const CLAIM_QUERY_PARAM: &str = "claim";

/// Claim token domain model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claim {
    /// The token itself; doubles as the document id.
    pub id: String,
    pub member_id: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Claim {
    /// Create a claim for `member_id` valid for `ttl_secs` from `now`.
    pub fn new(token: String, member_id: String, now: DateTime<Utc>, ttl_secs: i64) -> Self {
        Self {
            id: token,
            member_id,
            created_at: now,
            expires_at: now + Duration::seconds(ttl_secs),
        }
    }

    /// Check if the claim has expired at the given instant.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }
}

/// Build the link encoded into the QR code.
pub fn claim_url(app_base_url: &str, token: &str) -> String {
    format!(
        "{}/?{}={}",
        app_base_url.trim_end_matches('/'),
        CLAIM_QUERY_PARAM,
        token
    )
}

/// Claim exchange request, version 1.
///
/// Unknown fields are rejected so that clients cannot drift into the loose
/// shapes older runtimes accepted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ClaimExchangeRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// External identity of the device that scanned the code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scanner_uid: Option<String>,
}

impl ClaimExchangeRequest {
    pub fn new(token: impl Into<String>, scanner_uid: Option<String>) -> Self {
        Self {
            token: Some(token.into()),
            scanner_uid,
        }
    }

    /// The trimmed token, if one was supplied.
    pub fn token(&self) -> Option<&str> {
        non_blank(self.token.as_deref())
    }

    /// The trimmed scanner identity, if one was supplied.
    pub fn scanner_uid(&self) -> Option<&str> {
        non_blank(self.scanner_uid.as_deref())
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Successful claim exchange.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClaimExchangeResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jwt: Option<String>,
    /// Present when a scanner identity took part in the exchange.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linked: Option<bool>,
    #[serde(rename = "memberId", default, skip_serializing_if = "Option::is_none")]
    pub member_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub appwrite_uid: Option<String>,
}

/// Response for claim issuance.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateClaimResponse {
    pub token: String,
    pub member_id: String,
    pub expires_at: DateTime<Utc>,
    pub claim_url: String,
}
