//! Claim-token exchange.
//!
//! A claim is consumed at most once. The delete happens before any linking
//! or minting, and a delete that finds nothing means another request won
//! the race, so the loser sees `invalid token`. If linking then fails the
//! claim is put back so the scanner can retry.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use domain::models::{
    claim_url, Claim, ClaimExchangeRequest, ClaimExchangeResponse, CreateClaimResponse, Member,
};
use domain::services::IdentityService;
use persistence::repositories::{ClaimRepository, MemberRepository};
use persistence::store::StoreError;
use shared::crypto::{generate_document_id, token_fingerprint};
use shared::validation::validate_document_id;
use thiserror::Error;
use tracing::{info, warn};

use crate::error::ApiError;
use crate::middleware::metrics::record_claim_exchange;

#[derive(Debug, Error, PartialEq)]
pub enum ClaimError {
    #[error("missing token")]
    MissingToken,

    #[error("invalid token")]
    InvalidToken,

    #[error("token expired")]
    TokenExpired,

    #[error("no linked user")]
    NoLinkedUser,

    #[error("member not found: {0}")]
    MemberNotFound(String),

    #[error("server error: {0}")]
    Server(String),
}

impl ClaimError {
    fn outcome(&self) -> &'static str {
        match self {
            ClaimError::MissingToken => "missing_token",
            ClaimError::InvalidToken => "invalid_token",
            ClaimError::TokenExpired => "expired",
            ClaimError::NoLinkedUser => "no_linked_user",
            ClaimError::MemberNotFound(_) => "member_not_found",
            ClaimError::Server(_) => "server_error",
        }
    }
}

impl From<StoreError> for ClaimError {
    fn from(err: StoreError) -> Self {
        ClaimError::Server(err.to_string())
    }
}

impl From<ClaimError> for ApiError {
    fn from(err: ClaimError) -> Self {
        match err {
            ClaimError::MissingToken => ApiError::MissingToken,
            ClaimError::InvalidToken => ApiError::InvalidToken,
            ClaimError::TokenExpired => ApiError::TokenExpired,
            ClaimError::NoLinkedUser => ApiError::NoLinkedUser,
            ClaimError::MemberNotFound(id) => ApiError::NotFound(format!("Member {} not found", id)),
            ClaimError::Server(details) => ApiError::Server(details),
        }
    }
}

/// Issues and exchanges claim tokens.
#[derive(Clone)]
pub struct ClaimService {
    claims: ClaimRepository,
    members: MemberRepository,
    identity: Arc<dyn IdentityService>,
    ttl_secs: i64,
    app_base_url: String,
}

impl ClaimService {
    pub fn new(
        claims: ClaimRepository,
        members: MemberRepository,
        identity: Arc<dyn IdentityService>,
        ttl_secs: i64,
        app_base_url: impl Into<String>,
    ) -> Self {
        Self {
            claims,
            members,
            identity,
            ttl_secs,
            app_base_url: app_base_url.into(),
        }
    }

    /// Create a claim for an existing member.
    pub async fn issue(
        &self,
        member_id: &str,
        now: DateTime<Utc>,
    ) -> Result<CreateClaimResponse, ClaimError> {
        if self.members.find(member_id).await?.is_none() {
            return Err(ClaimError::MemberNotFound(member_id.to_string()));
        }

        let claim = Claim::new(
            generate_document_id(),
            member_id.to_string(),
            now,
            self.ttl_secs,
        );
        let claim = self.claims.create(&claim).await?;

        info!(
            member_id = %member_id,
            token = %token_fingerprint(&claim.id),
            expires_at = %claim.expires_at,
            "Issued claim"
        );

        Ok(CreateClaimResponse {
            claim_url: claim_url(&self.app_base_url, &claim.id),
            token: claim.id,
            member_id: claim.member_id,
            expires_at: claim.expires_at,
        })
    }

    /// Exchange a claim token for a session credential.
    pub async fn exchange(
        &self,
        request: &ClaimExchangeRequest,
        now: DateTime<Utc>,
    ) -> Result<ClaimExchangeResponse, ClaimError> {
        let result = self.exchange_inner(request, now).await;
        match &result {
            Ok(response) if response.linked.is_some() => record_claim_exchange("linked"),
            Ok(_) => record_claim_exchange("authenticated"),
            Err(e) => record_claim_exchange(e.outcome()),
        }
        result
    }

    async fn exchange_inner(
        &self,
        request: &ClaimExchangeRequest,
        now: DateTime<Utc>,
    ) -> Result<ClaimExchangeResponse, ClaimError> {
        let token = request.token().ok_or(ClaimError::MissingToken)?;
        let fingerprint = token_fingerprint(token);

        // Anything that cannot be a document id cannot name a claim.
        if validate_document_id(token).is_err() {
            return Err(ClaimError::InvalidToken);
        }

        let claim = self
            .claims
            .find(token)
            .await?
            .ok_or(ClaimError::InvalidToken)?;

        if claim.is_expired_at(now) {
            if let Err(e) = self.claims.consume(token).await {
                warn!(token = %fingerprint, error = %e, "Failed to delete expired claim");
            }
            info!(token = %fingerprint, "Rejected expired claim");
            return Err(ClaimError::TokenExpired);
        }

        let member = match self.members.find(&claim.member_id).await? {
            Some(member) => member,
            None => {
                warn!(
                    token = %fingerprint,
                    member_id = %claim.member_id,
                    "Claim references a missing member"
                );
                return Err(ClaimError::NoLinkedUser);
            }
        };

        let consumed = match self.claims.consume(token).await {
            Ok(true) => true,
            Ok(false) => return Err(ClaimError::InvalidToken),
            Err(e) => {
                warn!(token = %fingerprint, error = %e, "Failed to delete claim");
                false
            }
        };

        let scanner_uid = request.scanner_uid();
        let canonical_uid = match self.canonical_uid(&member, scanner_uid).await {
            Ok(uid) => uid,
            Err(e) => {
                if consumed {
                    self.restore(&claim, &fingerprint).await;
                }
                return Err(e);
            }
        };

        let jwt = match canonical_uid.as_deref() {
            Some(uid) => match self.identity.mint_jwt(uid).await {
                Ok(jwt) => Some(jwt),
                Err(e) => {
                    warn!(member_id = %member.id, user_id = %uid, error = %e, "Failed to mint JWT");
                    None
                }
            },
            None => None,
        };

        info!(
            token = %fingerprint,
            member_id = %member.id,
            linked = scanner_uid.is_some(),
            has_jwt = jwt.is_some(),
            "Claim exchanged"
        );

        Ok(ClaimExchangeResponse {
            jwt,
            linked: scanner_uid.map(|_| true),
            member_id: Some(member.id),
            appwrite_uid: canonical_uid,
        })
    }

    /// Put a consumed claim back after a failed link.
    async fn restore(&self, claim: &Claim, fingerprint: &str) {
        match self.claims.create(claim).await {
            Ok(_) => info!(token = %fingerprint, "Restored claim after failed link"),
            Err(e) => warn!(token = %fingerprint, error = %e, "Failed to restore claim"),
        }
    }

    /// The member's canonical identity, linking `scanner_uid` when the
    /// member has none yet. The first identity linked wins.
    async fn canonical_uid(
        &self,
        member: &Member,
        scanner_uid: Option<&str>,
    ) -> Result<Option<String>, ClaimError> {
        match (member.appwrite_uid.as_deref(), scanner_uid) {
            (Some(existing), Some(scanner)) if existing != scanner => {
                info!(
                    member_id = %member.id,
                    "Member already linked to another identity; keeping it"
                );
                Ok(Some(existing.to_string()))
            }
            (Some(existing), _) => Ok(Some(existing.to_string())),
            (None, Some(scanner)) => {
                let linked = self.members.set_appwrite_uid(&member.id, scanner).await?;
                info!(member_id = %member.id, "Linked member to scanner identity");
                Ok(linked.appwrite_uid.or_else(|| Some(scanner.to_string())))
            }
            (None, None) => Ok(None),
        }
    }
}
