//! Ledger log document.

use chrono::{DateTime, Utc};
use domain::models::{LogEntry, LogType, NewLogEntry};
use serde::{Deserialize, Serialize};

use super::serialize_timestamp;

/// Log document as stored.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntity {
    #[serde(rename = "$id")]
    pub id: String,
    #[serde(rename = "type")]
    pub log_type: LogType,
    pub amount: f64,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub user_name: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub file_id: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl From<LogEntity> for LogEntry {
    fn from(entity: LogEntity) -> Self {
        LogEntry {
            id: entity.id,
            log_type: entity.log_type,
            amount: entity.amount,
            user_id: entity.user_id,
            user_name: entity.user_name,
            message: entity.message.unwrap_or_default(),
            file_id: entity.file_id.filter(|id| !id.is_empty()),
            timestamp: entity.timestamp,
        }
    }
}

/// Fields written when a log entry is appended.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogDocument<'a> {
    #[serde(rename = "type")]
    pub log_type: LogType,
    pub amount: f64,
    pub user_id: &'a str,
    pub user_name: &'a str,
    pub message: &'a str,
    pub file_id: Option<&'a str>,
    #[serde(serialize_with = "serialize_timestamp")]
    pub timestamp: DateTime<Utc>,
}

impl<'a> LogDocument<'a> {
    pub fn new(entry: &'a NewLogEntry, timestamp: DateTime<Utc>) -> Self {
        Self {
            log_type: entry.log_type,
            amount: entry.amount,
            user_id: &entry.user_id,
            user_name: &entry.user_name,
            message: &entry.message,
            file_id: entry.file_id.as_deref(),
            timestamp,
        }
    }
}
