//! Read-only analytics views over members and the ledger log.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::log_entry::LogEntry;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct WeeklyCoffeeCount {
    pub label: String,
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LeaderboardEntry {
    pub member_id: String,
    pub name: String,
    pub total_coffees: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DailySpending {
    pub date: NaiveDate,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CategorySpending {
    pub category: String,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct OutstandingBalance {
    pub member_id: String,
    pub name: String,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ActivityItem {
    #[serde(flatten)]
    pub log: LogEntry,
    pub is_own: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct UserStats {
    pub total_coffees: i64,
    pub total_spent: f64,
    pub per_week_average: f64,
    pub balance: f64,
}

/// Everything the analytics page shows for one member.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct AnalyticsResponse {
    pub weekly_coffees: Vec<WeeklyCoffeeCount>,
    pub leaderboard: Vec<LeaderboardEntry>,
    pub daily_group_spending: Vec<DailySpending>,
    pub purchase_breakdown: Vec<CategorySpending>,
    pub outstanding_balances: Vec<OutstandingBalance>,
    pub activity: Vec<ActivityItem>,
    pub user_stats: UserStats,
}
