//! Claim token document.

use chrono::{DateTime, Utc};
use domain::models::Claim;
use serde::{Deserialize, Serialize};

use super::serialize_timestamp;

/// Claim document as stored; the document id is the token.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimEntity {
    #[serde(rename = "$id")]
    pub id: String,
    pub member_id: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl From<ClaimEntity> for Claim {
    fn from(entity: ClaimEntity) -> Self {
        Claim {
            id: entity.id,
            member_id: entity.member_id,
            created_at: entity.created_at,
            expires_at: entity.expires_at,
        }
    }
}

/// Fields written when a claim is issued.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimDocument<'a> {
    pub member_id: &'a str,
    #[serde(serialize_with = "serialize_timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(serialize_with = "serialize_timestamp")]
    pub expires_at: DateTime<Utc>,
}

impl<'a> From<&'a Claim> for ClaimDocument<'a> {
    fn from(claim: &'a Claim) -> Self {
        Self {
            member_id: &claim.member_id,
            created_at: claim.created_at,
            expires_at: claim.expires_at,
        }
    }
}
