//! Document store abstraction.
//!
//! Repositories talk to a [`DocumentStore`]; the Appwrite REST backend is
//! used in production and [`crate::memory::MemoryStore`] in tests and local
//! development.

use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;

/// Attribute holding a document's id.
pub const ID_ATTRIBUTE: &str = "$id";

/// Errors returned by document store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Document not found")]
    NotFound,

    #[error("Document already exists")]
    Conflict,

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Store API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Failed to decode document: {0}")]
    Decode(String),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound)
    }
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        StoreError::Http(err.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Decode(err.to_string())
    }
}

/// List filter understood by every backend.
#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    Equal { attribute: String, values: Vec<Value> },
    OrderDesc(String),
    OrderAsc(String),
    Limit(usize),
}

impl Query {
    pub fn equal(attribute: impl Into<String>, value: impl Into<Value>) -> Self {
        Query::Equal {
            attribute: attribute.into(),
            values: vec![value.into()],
        }
    }

    pub fn equal_any(attribute: impl Into<String>, values: Vec<Value>) -> Self {
        Query::Equal {
            attribute: attribute.into(),
            values,
        }
    }

    pub fn order_desc(attribute: impl Into<String>) -> Self {
        Query::OrderDesc(attribute.into())
    }

    pub fn order_asc(attribute: impl Into<String>) -> Self {
        Query::OrderAsc(attribute.into())
    }

    pub fn limit(limit: usize) -> Self {
        Query::Limit(limit)
    }

    /// JSON form sent as a `queries[]` parameter.
    pub fn to_json(&self) -> Value {
        match self {
            Query::Equal { attribute, values } => {
                json!({ "method": "equal", "attribute": attribute, "values": values })
            }
            Query::OrderDesc(attribute) => json!({ "method": "orderDesc", "attribute": attribute }),
            Query::OrderAsc(attribute) => json!({ "method": "orderAsc", "attribute": attribute }),
            Query::Limit(limit) => json!({ "method": "limit", "values": [limit] }),
        }
    }
}

impl Serialize for Query {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

/// Generic document database operations.
///
/// Documents are JSON objects carrying their id under `$id`.
#[async_trait::async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch one document, `None` when it does not exist.
    async fn get_document(&self, collection: &str, id: &str) -> Result<Option<Value>, StoreError>;

    async fn list_documents(
        &self,
        collection: &str,
        queries: &[Query],
    ) -> Result<Vec<Value>, StoreError>;

    /// Create a document; [`StoreError::Conflict`] when the id is taken.
    async fn create_document(
        &self,
        collection: &str,
        id: &str,
        data: Value,
    ) -> Result<Value, StoreError>;

    /// Overwrite the given fields of an existing document.
    async fn update_document(
        &self,
        collection: &str,
        id: &str,
        data: Value,
    ) -> Result<Value, StoreError>;

    /// Delete a document; [`StoreError::NotFound`] when it is already gone.
    async fn delete_document(&self, collection: &str, id: &str) -> Result<(), StoreError>;

    /// Atomically add `delta` to a numeric attribute.
    async fn increment_attribute(
        &self,
        collection: &str,
        id: &str,
        attribute: &str,
        delta: f64,
    ) -> Result<Value, StoreError>;

    /// Check the backend is reachable.
    async fn ping(&self) -> Result<(), StoreError>;
}
