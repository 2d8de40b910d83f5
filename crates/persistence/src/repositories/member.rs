//! Member repository.

use std::sync::Arc;

use domain::models::Member;
use domain::services::CoffeeCharge;
use serde_json::{json, Value};

use crate::entities::member::NewMemberDocument;
use crate::entities::{decode, MemberEntity};
use crate::store::{DocumentStore, Query, StoreError};

/// Upper bound on members listed at once.
const MEMBER_LIST_LIMIT: usize = 500;

/// Repository for member documents.
#[derive(Clone)]
pub struct MemberRepository {
    store: Arc<dyn DocumentStore>,
    collection: String,
}

impl MemberRepository {
    pub fn new(store: Arc<dyn DocumentStore>, collection: impl Into<String>) -> Self {
        Self {
            store,
            collection: collection.into(),
        }
    }

    fn to_member(doc: Value) -> Result<Member, StoreError> {
        decode::<MemberEntity>(doc).map(Into::into)
    }

    pub async fn find(&self, id: &str) -> Result<Option<Member>, StoreError> {
        self.store
            .get_document(&self.collection, id)
            .await?
            .map(Self::to_member)
            .transpose()
    }

    /// Find the member linked to an external identity.
    pub async fn find_by_appwrite_uid(&self, uid: &str) -> Result<Option<Member>, StoreError> {
        let docs = self
            .store
            .list_documents(
                &self.collection,
                &[Query::equal("appwrite_uid", uid), Query::limit(1)],
            )
            .await?;

        docs.into_iter().next().map(Self::to_member).transpose()
    }

    /// All members, by name.
    pub async fn list(&self) -> Result<Vec<Member>, StoreError> {
        self.store
            .list_documents(
                &self.collection,
                &[Query::order_asc("name"), Query::limit(MEMBER_LIST_LIMIT)],
            )
            .await?
            .into_iter()
            .map(Self::to_member)
            .collect()
    }

    pub async fn create(&self, id: &str, name: &str) -> Result<Member, StoreError> {
        let data = serde_json::to_value(NewMemberDocument::new(name))?;
        let doc = self.store.create_document(&self.collection, id, data).await?;
        Self::to_member(doc)
    }

    /// Record `uid` as the member's canonical identity.
    pub async fn set_appwrite_uid(&self, id: &str, uid: &str) -> Result<Member, StoreError> {
        let doc = self
            .store
            .update_document(&self.collection, id, json!({ "appwrite_uid": uid }))
            .await?;
        Self::to_member(doc)
    }

    /// Charge one coffee to the member.
    ///
    /// Each field moves by an atomic increment, so concurrent coffees never
    /// overwrite each other.
    pub async fn apply_coffee(&self, id: &str, charge: &CoffeeCharge) -> Result<Member, StoreError> {
        self.store
            .increment_attribute(&self.collection, id, "balance", -charge.total)
            .await?;
        if charge.has_surcharge() {
            self.store
                .increment_attribute(&self.collection, id, "surcharge_total", charge.surcharge)
                .await?;
        }
        let doc = self
            .store
            .increment_attribute(&self.collection, id, "total_coffees", 1.0)
            .await?;
        Self::to_member(doc)
    }

    /// Add `amount` to the member's balance.
    pub async fn credit(&self, id: &str, amount: f64) -> Result<Member, StoreError> {
        let doc = self
            .store
            .increment_attribute(&self.collection, id, "balance", amount)
            .await?;
        Self::to_member(doc)
    }
}
