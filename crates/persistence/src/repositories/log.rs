//! Ledger log repository.

use std::sync::Arc;

use chrono::Utc;
use domain::models::{LogEntry, LogType, NewLogEntry};
use serde_json::json;

use crate::entities::log::LogDocument;
use crate::entities::{decode, LogEntity};
use crate::store::{DocumentStore, Query, StoreError};

/// Repository for the append-only log collection.
#[derive(Clone)]
pub struct LogRepository {
    store: Arc<dyn DocumentStore>,
    collection: String,
}

impl LogRepository {
    pub fn new(store: Arc<dyn DocumentStore>, collection: impl Into<String>) -> Self {
        Self {
            store,
            collection: collection.into(),
        }
    }

    /// Append an entry stamped with the current time.
    pub async fn append(&self, entry: &NewLogEntry) -> Result<LogEntry, StoreError> {
        let id = shared::crypto::generate_document_id();
        let data = serde_json::to_value(LogDocument::new(entry, Utc::now()))?;
        let doc = self.store.create_document(&self.collection, &id, data).await?;
        decode::<LogEntity>(doc).map(Into::into)
    }

    async fn query(&self, queries: &[Query]) -> Result<Vec<LogEntry>, StoreError> {
        self.store
            .list_documents(&self.collection, queries)
            .await?
            .into_iter()
            .map(|doc| decode::<LogEntity>(doc).map(Into::into))
            .collect()
    }

    /// Latest `limit` entries, newest first.
    pub async fn recent(&self, limit: usize) -> Result<Vec<LogEntry>, StoreError> {
        self.query(&[Query::order_desc("timestamp"), Query::limit(limit)])
            .await
    }

    /// Latest group purchases (expenses and beans), newest first.
    pub async fn recent_group_purchases(&self, limit: usize) -> Result<Vec<LogEntry>, StoreError> {
        self.query(&[
            Query::equal_any(
                "type",
                vec![json!(LogType::Expense.as_str()), json!(LogType::Beans.as_str())],
            ),
            Query::order_desc("timestamp"),
            Query::limit(limit),
        ])
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use domain::models::Member;

    fn member() -> Member {
        Member {
            id: "m1".into(),
            name: "Ada".into(),
            balance: 0.0,
            total_coffees: 0,
            appwrite_uid: None,
            surcharge_total: 0.0,
        }
    }

    #[tokio::test]
    async fn test_append_and_recent() {
        let repo = LogRepository::new(Arc::new(MemoryStore::new()), "logs");
        let first = repo.append(&NewLogEntry::coffee(&member(), 0.5)).await.unwrap();
        assert_eq!(first.log_type, LogType::Coffee);
        assert_eq!(first.amount, -0.5);
        assert_eq!(first.user_id, "m1");

        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let second = repo
            .append(&NewLogEntry::top_up(&member(), 5.0, None))
            .await
            .unwrap();

        let logs = repo.recent(10).await.unwrap();
        assert_eq!(logs.len(), 2);
        assert_eq!(logs[0].id, second.id);

        assert_eq!(repo.recent(1).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_recent_group_purchases() {
        let repo = LogRepository::new(Arc::new(MemoryStore::new()), "logs");
        repo.append(&NewLogEntry::coffee(&member(), 0.5)).await.unwrap();
        repo.append(&NewLogEntry::expense(4.0, "milk".into(), None))
            .await
            .unwrap();
        repo.append(&NewLogEntry::beans(18.0, "beans".into(), None))
            .await
            .unwrap();

        let logs = repo.recent_group_purchases(10).await.unwrap();
        assert_eq!(logs.len(), 2);
        assert!(logs.iter().all(|l| l.log_type.is_group_purchase()));
        assert!(logs.iter().all(|l| l.user_id == "ADMIN"));
    }
}
