//! In-process document store.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use chrono::{SecondsFormat, Utc};
use serde_json::{Map, Value};
use tokio::sync::Mutex;

use crate::store::{DocumentStore, Query, StoreError, ID_ATTRIBUTE};

type Collection = BTreeMap<String, Map<String, Value>>;

/// Document store kept in memory.
///
/// Every operation holds a single lock, so increments are atomic.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: Mutex<HashMap<String, Collection>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents in `collection`.
    pub async fn count(&self, collection: &str) -> usize {
        self.collections
            .lock()
            .await
            .get(collection)
            .map_or(0, |c| c.len())
    }
}

fn as_object(data: Value) -> Result<Map<String, Value>, StoreError> {
    match data {
        Value::Object(map) => Ok(map),
        other => Err(StoreError::Decode(format!(
            "document data must be an object, got {}",
            other
        ))),
    }
}

fn compare(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.total_cmp(&y)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        _ => Ordering::Equal,
    }
}

fn apply_queries(mut docs: Vec<Map<String, Value>>, queries: &[Query]) -> Vec<Map<String, Value>> {
    let mut limit = None;

    for query in queries {
        match query {
            Query::Equal { attribute, values } => {
                docs.retain(|doc| doc.get(attribute).is_some_and(|v| values.contains(v)));
            }
            Query::OrderDesc(attribute) => {
                docs.sort_by(|a, b| compare(b.get(attribute), a.get(attribute)));
            }
            Query::OrderAsc(attribute) => {
                docs.sort_by(|a, b| compare(a.get(attribute), b.get(attribute)));
            }
            Query::Limit(n) => limit = Some(*n),
        }
    }

    if let Some(n) = limit {
        docs.truncate(n);
    }
    docs
}

#[async_trait::async_trait]
impl DocumentStore for MemoryStore {
    async fn get_document(&self, collection: &str, id: &str) -> Result<Option<Value>, StoreError> {
        let collections = self.collections.lock().await;
        Ok(collections
            .get(collection)
            .and_then(|c| c.get(id))
            .cloned()
            .map(Value::Object))
    }

    async fn list_documents(
        &self,
        collection: &str,
        queries: &[Query],
    ) -> Result<Vec<Value>, StoreError> {
        let collections = self.collections.lock().await;
        let docs: Vec<_> = collections
            .get(collection)
            .map(|c| c.values().cloned().collect())
            .unwrap_or_default();

        Ok(apply_queries(docs, queries)
            .into_iter()
            .map(Value::Object)
            .collect())
    }

    async fn create_document(
        &self,
        collection: &str,
        id: &str,
        data: Value,
    ) -> Result<Value, StoreError> {
        let mut doc = as_object(data)?;
        let mut collections = self.collections.lock().await;
        let docs = collections.entry(collection.to_string()).or_default();
        if docs.contains_key(id) {
            return Err(StoreError::Conflict);
        }

        doc.insert(ID_ATTRIBUTE.to_string(), Value::String(id.to_string()));
        doc.insert(
            "$createdAt".to_string(),
            Value::String(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)),
        );
        docs.insert(id.to_string(), doc.clone());
        Ok(Value::Object(doc))
    }

    async fn update_document(
        &self,
        collection: &str,
        id: &str,
        data: Value,
    ) -> Result<Value, StoreError> {
        let fields = as_object(data)?;
        let mut collections = self.collections.lock().await;
        let doc = collections
            .get_mut(collection)
            .and_then(|c| c.get_mut(id))
            .ok_or(StoreError::NotFound)?;

        for (key, value) in fields {
            if key != ID_ATTRIBUTE {
                doc.insert(key, value);
            }
        }
        Ok(Value::Object(doc.clone()))
    }

    async fn delete_document(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        let mut collections = self.collections.lock().await;
        collections
            .get_mut(collection)
            .and_then(|c| c.remove(id))
            .map(|_| ())
            .ok_or(StoreError::NotFound)
    }

    async fn increment_attribute(
        &self,
        collection: &str,
        id: &str,
        attribute: &str,
        delta: f64,
    ) -> Result<Value, StoreError> {
        let mut collections = self.collections.lock().await;
        let doc = collections
            .get_mut(collection)
            .and_then(|c| c.get_mut(id))
            .ok_or(StoreError::NotFound)?;

        let current = doc.get(attribute).and_then(Value::as_f64).unwrap_or(0.0);
        let updated = current + delta;
        // Integer attributes stay integers.
        let value = if updated.fract() == 0.0 && doc.get(attribute).map_or(true, Value::is_i64) {
            Value::from(updated as i64)
        } else {
            Value::from(updated)
        };
        doc.insert(attribute.to_string(), value);
        Ok(Value::Object(doc.clone()))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_create_get_delete() {
        let store = MemoryStore::new();
        let created = store
            .create_document("members", "m1", json!({"name": "Ada"}))
            .await
            .unwrap();
        assert_eq!(created["$id"], "m1");

        let doc = store.get_document("members", "m1").await.unwrap().unwrap();
        assert_eq!(doc["name"], "Ada");

        store.delete_document("members", "m1").await.unwrap();
        assert!(store.get_document("members", "m1").await.unwrap().is_none());
        assert!(matches!(
            store.delete_document("members", "m1").await,
            Err(StoreError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_create_conflict() {
        let store = MemoryStore::new();
        store.create_document("claims", "t1", json!({})).await.unwrap();
        assert!(matches!(
            store.create_document("claims", "t1", json!({})).await,
            Err(StoreError::Conflict)
        ));
    }

    #[tokio::test]
    async fn test_update_merges_fields() {
        let store = MemoryStore::new();
        store
            .create_document("members", "m1", json!({"name": "Ada", "balance": 1.0}))
            .await
            .unwrap();
        let doc = store
            .update_document("members", "m1", json!({"appwrite_uid": "u1"}))
            .await
            .unwrap();
        assert_eq!(doc["name"], "Ada");
        assert_eq!(doc["appwrite_uid"], "u1");

        assert!(matches!(
            store.update_document("members", "nope", json!({})).await,
            Err(StoreError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_queries() {
        let store = MemoryStore::new();
        for (id, kind, ts) in [
            ("a", "COFFEE", "2024-01-01T00:00:00.000Z"),
            ("b", "EXPENSE", "2024-01-03T00:00:00.000Z"),
            ("c", "BEANS", "2024-01-02T00:00:00.000Z"),
        ] {
            store
                .create_document("logs", id, json!({"type": kind, "timestamp": ts}))
                .await
                .unwrap();
        }

        let docs = store
            .list_documents(
                "logs",
                &[
                    Query::equal_any("type", vec![json!("EXPENSE"), json!("BEANS")]),
                    Query::order_desc("timestamp"),
                    Query::limit(10),
                ],
            )
            .await
            .unwrap();
        let ids: Vec<_> = docs.iter().map(|d| d["$id"].as_str().unwrap()).collect();
        assert_eq!(ids, vec!["b", "c"]);

        let docs = store
            .list_documents("logs", &[Query::order_asc("timestamp"), Query::limit(1)])
            .await
            .unwrap();
        assert_eq!(docs[0]["$id"], "a");

        assert!(store.list_documents("empty", &[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_increment() {
        let store = MemoryStore::new();
        store
            .create_document("members", "m1", json!({"balance": 0.3, "total_coffees": 2}))
            .await
            .unwrap();

        let doc = store
            .increment_attribute("members", "m1", "total_coffees", 1.0)
            .await
            .unwrap();
        assert_eq!(doc["total_coffees"], json!(3));

        let doc = store
            .increment_attribute("members", "m1", "balance", -0.75)
            .await
            .unwrap();
        assert!((doc["balance"].as_f64().unwrap() + 0.45).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_concurrent_increments_do_not_lose_updates() {
        let store = Arc::new(MemoryStore::new());
        store
            .create_document("members", "m1", json!({"total_coffees": 0}))
            .await
            .unwrap();

        let handles: Vec<_> = (0..50)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move {
                    store
                        .increment_attribute("members", "m1", "total_coffees", 1.0)
                        .await
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let doc = store.get_document("members", "m1").await.unwrap().unwrap();
        assert_eq!(doc["total_coffees"], json!(50));
    }
}
