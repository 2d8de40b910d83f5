//! Claim token repository.

use std::sync::Arc;

use domain::models::Claim;

use crate::entities::claim::ClaimDocument;
use crate::entities::{decode, ClaimEntity};
use crate::store::{DocumentStore, StoreError};

/// Repository for single-use claim documents.
#[derive(Clone)]
pub struct ClaimRepository {
    store: Arc<dyn DocumentStore>,
    collection: String,
}

impl ClaimRepository {
    pub fn new(store: Arc<dyn DocumentStore>, collection: impl Into<String>) -> Self {
        Self {
            store,
            collection: collection.into(),
        }
    }

    /// Store a new claim keyed by its token.
    pub async fn create(&self, claim: &Claim) -> Result<Claim, StoreError> {
        let data = serde_json::to_value(ClaimDocument::from(claim))?;
        let doc = self
            .store
            .create_document(&self.collection, &claim.id, data)
            .await?;
        decode::<ClaimEntity>(doc).map(Into::into)
    }

    pub async fn find(&self, token: &str) -> Result<Option<Claim>, StoreError> {
        self.store
            .get_document(&self.collection, token)
            .await?
            .map(|doc| decode::<ClaimEntity>(doc).map(Into::into))
            .transpose()
    }

    /// Delete the claim.
    ///
    /// Returns `false` when it was already gone, meaning another request
    /// consumed it first.
    pub async fn consume(&self, token: &str) -> Result<bool, StoreError> {
        match self.store.delete_document(&self.collection, token).await {
            Ok(()) => Ok(true),
            Err(StoreError::NotFound) => Ok(false),
            Err(e) => Err(e),
        }
    }
}
