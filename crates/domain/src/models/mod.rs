//! Domain models for the coffee tab.

pub mod analytics;
pub mod claim;
pub mod global_config;
pub mod ledger;
pub mod log_entry;
pub mod member;

pub use analytics::{
    ActivityItem, AnalyticsResponse, CategorySpending, DailySpending, LeaderboardEntry,
    OutstandingBalance, UserStats, WeeklyCoffeeCount,
};
pub use claim::{
    claim_url, Claim, ClaimExchangeRequest, ClaimExchangeResponse, CreateClaimResponse,
    CLAIM_TTL_SECS,
};
pub use global_config::{GlobalConfig, GLOBAL_CONFIG_ID};
pub use ledger::{
    BeanPurchaseRequest, BeanPurchaseResult, CoffeeReceipt, ExpenseRequest, LedgerResult,
    ReceiptUpload, ReceiptUrlResponse, TopUpRequest, UpdateGramsPerCupRequest,
    UpdateSurchargeRequest,
};
pub use log_entry::{LogEntry, LogType, NewLogEntry, SYSTEM_USER_ID, SYSTEM_USER_NAME};
pub use member::{AdminOverview, CreateMemberRequest, Member};
