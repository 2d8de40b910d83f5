//! Ledger log domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::member::Member;

/// User id recorded on group-level entries.
pub const SYSTEM_USER_ID: &str = "ADMIN";

/// User name recorded on group-level entries.
pub const SYSTEM_USER_NAME: &str = "System";

/// Kind of ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LogType {
    Coffee,
    Expense,
    Beans,
    Topup,
    Surcharge,
}

impl LogType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogType::Coffee => "COFFEE",
            LogType::Expense => "EXPENSE",
            LogType::Beans => "BEANS",
            LogType::Topup => "TOPUP",
            LogType::Surcharge => "SURCHARGE",
        }
    }

    /// Entries paid out of the collective pot.
    pub fn is_group_purchase(&self) -> bool {
        matches!(self, LogType::Expense | LogType::Beans)
    }
}

impl fmt::Display for LogType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "COFFEE" => Ok(LogType::Coffee),
            "EXPENSE" => Ok(LogType::Expense),
            "BEANS" => Ok(LogType::Beans),
            "TOPUP" => Ok(LogType::Topup),
            "SURCHARGE" => Ok(LogType::Surcharge),
            other => Err(format!("unknown log type: {}", other)),
        }
    }
}

/// An entry in the append-only ledger log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LogEntry {
    pub id: String,
    #[serde(rename = "type")]
    pub log_type: LogType,
    /// Signed euro amount; debits are negative.
    pub amount: f64,
    pub user_id: String,
    pub user_name: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_id: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// A log entry about to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct NewLogEntry {
    pub log_type: LogType,
    pub amount: f64,
    pub user_id: String,
    pub user_name: String,
    pub message: String,
    pub file_id: Option<String>,
}

impl NewLogEntry {
    fn for_member(log_type: LogType, member: &Member, amount: f64, message: String) -> Self {
        Self {
            log_type,
            amount,
            user_id: member.id.clone(),
            user_name: member.name.clone(),
            message,
            file_id: None,
        }
    }

    fn for_group(log_type: LogType, amount: f64, message: String, file_id: Option<String>) -> Self {
        Self {
            log_type,
            amount,
            user_id: SYSTEM_USER_ID.to_string(),
            user_name: SYSTEM_USER_NAME.to_string(),
            message,
            file_id,
        }
    }

    /// Coffee charged to a member at `price`.
    pub fn coffee(member: &Member, price: f64) -> Self {
        Self::for_member(LogType::Coffee, member, -price, String::new())
    }

    /// Surcharge added on top of a coffee the balance could not cover.
    pub fn surcharge(member: &Member, amount: f64, percent: f64) -> Self {
        Self::for_member(
            LogType::Surcharge,
            member,
            -amount,
            format!("{}% surcharge on uncovered coffee", percent),
        )
    }

    /// Money a member paid into the pot.
    pub fn top_up(member: &Member, amount: f64, message: Option<String>) -> Self {
        Self::for_member(LogType::Topup, member, amount, message.unwrap_or_default())
    }

    /// A group expense paid from the pot.
    pub fn expense(amount: f64, message: String, file_id: Option<String>) -> Self {
        Self::for_group(LogType::Expense, -amount, message, file_id)
    }

    /// A bean purchase paid from the pot.
    pub fn beans(amount: f64, message: String, file_id: Option<String>) -> Self {
        Self::for_group(LogType::Beans, -amount, message, file_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member() -> Member {
        Member {
            id: "m1".into(),
            name: "Ada".into(),
            balance: 1.0,
            total_coffees: 3,
            appwrite_uid: None,
            surcharge_total: 0.0,
        }
    }

    #[test]
    fn test_log_type_wire_format() {
        assert_eq!(serde_json::to_value(LogType::Topup).unwrap(), "TOPUP");
        assert_eq!(serde_json::to_value(LogType::Surcharge).unwrap(), "SURCHARGE");
        let parsed: LogType = serde_json::from_str("\"BEANS\"").unwrap();
        assert_eq!(parsed, LogType::Beans);
    }

    #[test]
    fn test_log_type_from_str() {
        for t in [
            LogType::Coffee,
            LogType::Expense,
            LogType::Beans,
            LogType::Topup,
            LogType::Surcharge,
        ] {
            assert_eq!(t.as_str().parse::<LogType>().unwrap(), t);
        }
        assert!("coffee".parse::<LogType>().is_err());
    }

    #[test]
    fn test_is_group_purchase() {
        assert!(LogType::Expense.is_group_purchase());
        assert!(LogType::Beans.is_group_purchase());
        assert!(!LogType::Coffee.is_group_purchase());
        assert!(!LogType::Topup.is_group_purchase());
    }

    #[test]
    fn test_member_entries_signs() {
        let m = member();
        let coffee = NewLogEntry::coffee(&m, 0.5);
        assert_eq!(coffee.amount, -0.5);
        assert_eq!(coffee.user_id, "m1");
        assert_eq!(coffee.user_name, "Ada");

        let top_up = NewLogEntry::top_up(&m, 10.0, Some("cash".into()));
        assert_eq!(top_up.amount, 10.0);
        assert_eq!(top_up.message, "cash");

        let surcharge = NewLogEntry::surcharge(&m, 0.25, 50.0);
        assert_eq!(surcharge.amount, -0.25);
        assert_eq!(surcharge.log_type, LogType::Surcharge);
    }

    #[test]
    fn test_group_entries_use_system_user() {
        let expense = NewLogEntry::expense(4.5, "milk".into(), Some("f1".into()));
        assert_eq!(expense.amount, -4.5);
        assert_eq!(expense.user_id, SYSTEM_USER_ID);
        assert_eq!(expense.user_name, SYSTEM_USER_NAME);
        assert_eq!(expense.file_id.as_deref(), Some("f1"));

        let beans = NewLogEntry::beans(18.0, "beans".into(), None);
        assert_eq!(beans.log_type, LogType::Beans);
        assert_eq!(beans.amount, -18.0);
    }

    #[test]
    fn test_log_entry_serializes_type_field() {
        let entry = LogEntry {
            id: "l1".into(),
            log_type: LogType::Coffee,
            amount: -0.5,
            user_id: "m1".into(),
            user_name: "Ada".into(),
            message: String::new(),
            file_id: None,
            timestamp: Utc::now(),
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["type"], "COFFEE");
        assert!(json.get("file_id").is_none());
    }
}
