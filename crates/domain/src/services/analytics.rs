//! Aggregations behind the analytics page.
//!
//! Every function is a pure view over already-loaded members and log
//! entries; callers pass `now` so bucketing is deterministic.

use chrono::{DateTime, Duration, Utc};
use shared::money::round_cents;

use crate::models::{
    ActivityItem, AnalyticsResponse, CategorySpending, DailySpending, LeaderboardEntry, LogEntry,
    LogType, Member, OutstandingBalance, UserStats, WeeklyCoffeeCount,
};

/// Number of weekly buckets in the coffee trend.
pub const WEEKS: usize = 4;
/// Days covered by the spending chart.
pub const SPENDING_DAYS: i64 = 30;
/// Entries shown on ranked lists.
pub const TOP_MEMBERS: usize = 8;
/// Entries shown in the activity feed.
pub const ACTIVITY_FEED_LEN: usize = 15;
/// Average number of weeks in a month.
const WEEKS_PER_MONTH: f64 = 4.29;

/// Coffees the member had per week over the last four weeks, oldest first.
pub fn weekly_coffee_counts(
    logs: &[LogEntry],
    member_id: &str,
    now: DateTime<Utc>,
) -> Vec<WeeklyCoffeeCount> {
    let mut buckets = [0u32; WEEKS];

    for log in logs
        .iter()
        .filter(|l| l.log_type == LogType::Coffee && l.user_id == member_id)
    {
        let age = now - log.timestamp;
        if age < Duration::zero() {
            continue;
        }
        let week = (age.num_days() / 7) as usize;
        if week < WEEKS {
            buckets[WEEKS - 1 - week] += 1;
        }
    }

    buckets
        .iter()
        .enumerate()
        .map(|(i, count)| WeeklyCoffeeCount {
            label: format!("Week {}", i + 1),
            count: *count,
        })
        .collect()
}

/// Members ranked by total coffees.
pub fn leaderboard(members: &[Member]) -> Vec<LeaderboardEntry> {
    let mut ranked: Vec<&Member> = members.iter().collect();
    ranked.sort_by(|a, b| b.total_coffees.cmp(&a.total_coffees));
    ranked
        .into_iter()
        .take(TOP_MEMBERS)
        .map(|m| LeaderboardEntry {
            member_id: m.id.clone(),
            name: m.name.clone(),
            total_coffees: m.total_coffees,
        })
        .collect()
}

/// Group purchase spending per day over the last 30 days, today included.
pub fn daily_group_spending(logs: &[LogEntry], now: DateTime<Utc>) -> Vec<DailySpending> {
    let today = now.date_naive();
    let start = today - Duration::days(SPENDING_DAYS - 1);

    let mut days: Vec<DailySpending> = (0..SPENDING_DAYS)
        .map(|i| DailySpending {
            date: start + Duration::days(i),
            amount: 0.0,
        })
        .collect();

    for log in logs.iter().filter(|l| l.log_type.is_group_purchase()) {
        let offset = (log.timestamp.date_naive() - start).num_days();
        if (0..SPENDING_DAYS).contains(&offset) {
            days[offset as usize].amount += log.amount.abs();
        }
    }

    for day in &mut days {
        day.amount = round_cents(day.amount);
    }
    days
}

/// Bucket a purchase message into a spending category.
pub fn categorize(message: &str) -> &'static str {
    let message = message.to_lowercase();
    let has = |words: &[&str]| words.iter().any(|w| message.contains(w));

    if has(&["coffee", "beans"]) {
        "Coffee Beans"
    } else if has(&["milk", "cream"]) {
        "Milk/Cream"
    } else if has(&["sugar", "sweetener"]) {
        "Sugar/Sweetener"
    } else if has(&["cup", "filter"]) {
        "Supplies"
    } else if has(&["machine", "equipment"]) {
        "Equipment"
    } else {
        "Other"
    }
}

/// Group purchase spending per category, in first-seen order.
pub fn purchase_breakdown(logs: &[LogEntry]) -> Vec<CategorySpending> {
    let mut categories: Vec<CategorySpending> = Vec::new();

    for log in logs.iter().filter(|l| l.log_type.is_group_purchase()) {
        let category = categorize(&log.message);
        match categories.iter_mut().find(|c| c.category == category) {
            Some(entry) => entry.amount += log.amount.abs(),
            None => categories.push(CategorySpending {
                category: category.to_string(),
                amount: log.amount.abs(),
            }),
        }
    }

    for entry in &mut categories {
        entry.amount = round_cents(entry.amount);
    }
    categories
}

/// Members ranked by the magnitude of their balance.
pub fn outstanding_balances(members: &[Member]) -> Vec<OutstandingBalance> {
    let mut ranked: Vec<&Member> = members.iter().collect();
    ranked.sort_by(|a, b| b.balance.abs().total_cmp(&a.balance.abs()));
    ranked
        .into_iter()
        .take(TOP_MEMBERS)
        .map(|m| OutstandingBalance {
            member_id: m.id.clone(),
            name: m.name.clone(),
            amount: m.balance.abs(),
        })
        .collect()
}

/// Latest entries, flagging the member's own.
///
/// Expects `logs` newest first.
pub fn activity_feed(logs: &[LogEntry], member_id: &str) -> Vec<ActivityItem> {
    logs.iter()
        .take(ACTIVITY_FEED_LEN)
        .map(|log| ActivityItem {
            is_own: log.user_id == member_id,
            log: log.clone(),
        })
        .collect()
}

pub fn user_stats(member: &Member, logs: &[LogEntry]) -> UserStats {
    let total_spent: f64 = logs
        .iter()
        .filter(|l| l.log_type == LogType::Coffee && l.user_id == member.id)
        .map(|l| l.amount.abs())
        .sum();

    UserStats {
        total_coffees: member.total_coffees,
        total_spent: round_cents(total_spent),
        per_week_average: (member.total_coffees as f64 / WEEKS_PER_MONTH * 10.0).round() / 10.0,
        balance: member.balance,
    }
}

/// Assemble the full analytics view for `member`.
pub fn build_analytics(
    member: &Member,
    members: &[Member],
    logs: &[LogEntry],
    now: DateTime<Utc>,
) -> AnalyticsResponse {
    AnalyticsResponse {
        weekly_coffees: weekly_coffee_counts(logs, &member.id, now),
        leaderboard: leaderboard(members),
        daily_group_spending: daily_group_spending(logs, now),
        purchase_breakdown: purchase_breakdown(logs),
        outstanding_balances: outstanding_balances(members),
        activity: activity_feed(logs, &member.id),
        user_stats: user_stats(member, logs),
    }
}
