//! Global configuration repository.

use std::sync::Arc;

use domain::models::{GlobalConfig, GLOBAL_CONFIG_ID};
use serde_json::json;
use tracing::info;

use crate::entities::global_config::GlobalConfigDocument;
use crate::entities::{decode, GlobalConfigEntity};
use crate::store::{DocumentStore, StoreError};

/// Repository for the singleton pricing and pot document.
#[derive(Clone)]
pub struct GlobalConfigRepository {
    store: Arc<dyn DocumentStore>,
    collection: String,
}

impl GlobalConfigRepository {
    pub fn new(store: Arc<dyn DocumentStore>, collection: impl Into<String>) -> Self {
        Self {
            store,
            collection: collection.into(),
        }
    }

    /// Current configuration, with defaults for anything missing.
    pub async fn get(&self) -> Result<GlobalConfig, StoreError> {
        match self.store.get_document(&self.collection, GLOBAL_CONFIG_ID).await? {
            Some(doc) => decode::<GlobalConfigEntity>(doc).map(Into::into),
            None => Ok(GlobalConfig::default()),
        }
    }

    /// Current configuration, creating the singleton when absent.
    pub async fn get_or_init(&self) -> Result<GlobalConfig, StoreError> {
        if let Some(doc) = self
            .store
            .get_document(&self.collection, GLOBAL_CONFIG_ID)
            .await?
        {
            return decode::<GlobalConfigEntity>(doc).map(Into::into);
        }

        let config = GlobalConfig::default();
        let data = serde_json::to_value(GlobalConfigDocument::from(&config))?;
        match self
            .store
            .create_document(&self.collection, GLOBAL_CONFIG_ID, data)
            .await
        {
            Ok(_) => {
                info!("Initialised global config document");
                Ok(config)
            }
            // Created concurrently.
            Err(StoreError::Conflict) => self.get().await,
            Err(e) => Err(e),
        }
    }

    /// Move the group pot by `delta`.
    pub async fn adjust_funds(&self, delta: f64) -> Result<GlobalConfig, StoreError> {
        self.get_or_init().await?;
        let doc = self
            .store
            .increment_attribute(&self.collection, GLOBAL_CONFIG_ID, "group_funds", delta)
            .await?;
        decode::<GlobalConfigEntity>(doc).map(Into::into)
    }

    pub async fn set_grams_per_cup(
        &self,
        grams_per_cup: f64,
        price_per_cup: f64,
    ) -> Result<GlobalConfig, StoreError> {
        self.update(json!({
            "grams_per_cup": grams_per_cup,
            "coffee_price_per_cup": price_per_cup,
        }))
        .await
    }

    pub async fn set_bean_pricing(
        &self,
        price_per_gram: f64,
        price_per_cup: f64,
    ) -> Result<GlobalConfig, StoreError> {
        self.update(json!({
            "coffee_price_per_gram": price_per_gram,
            "coffee_price_per_cup": price_per_cup,
        }))
        .await
    }

    pub async fn set_surcharge_percent(&self, percent: f64) -> Result<GlobalConfig, StoreError> {
        self.update(json!({ "surcharge_percent": percent })).await
    }

    async fn update(&self, fields: serde_json::Value) -> Result<GlobalConfig, StoreError> {
        self.get_or_init().await?;
        let doc = self
            .store
            .update_document(&self.collection, GLOBAL_CONFIG_ID, fields)
            .await?;
        decode::<GlobalConfigEntity>(doc).map(Into::into)
    }
}
