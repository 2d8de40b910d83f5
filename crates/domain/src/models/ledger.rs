//! Ledger request and response models.

use serde::{Deserialize, Serialize};
use validator::Validate;

use super::global_config::GlobalConfig;
use super::log_entry::LogEntry;
use crate::services::pricing::{BeanPricing, CoffeeCharge};

/// Receipt image attached to a group purchase, base64 encoded.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct ReceiptUpload {
    #[validate(length(min = 1, max = 255, message = "filename must be between 1 and 255 characters"))]
    pub filename: String,
    #[validate(length(min = 1, max = 100, message = "content_type must be between 1 and 100 characters"))]
    pub content_type: String,
    #[validate(length(min = 1, message = "receipt data must not be empty"))]
    pub data: String,
}

/// Admin request to credit a member.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct TopUpRequest {
    pub amount: f64,
    #[validate(length(max = 500, message = "message must be at most 500 characters"))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Admin request to pay a group expense from the pot.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct ExpenseRequest {
    pub amount: f64,
    #[validate(length(min = 1, max = 500, message = "message must be between 1 and 500 characters"))]
    pub message: String,
    #[validate(nested)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receipt: Option<ReceiptUpload>,
}

/// Admin request to record a bean purchase and reprice coffee.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct BeanPurchaseRequest {
    pub amount: f64,
    #[validate(range(min = 1.0, max = 100000.0, message = "grams must be between 1 and 100000"))]
    pub grams: f64,
    #[validate(nested)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receipt: Option<ReceiptUpload>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct UpdateGramsPerCupRequest {
    #[validate(range(min = 1.0, max = 100.0, message = "grams_per_cup must be between 1 and 100"))]
    pub grams_per_cup: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct UpdateSurchargeRequest {
    #[validate(custom(function = "shared::validation::validate_percent"))]
    pub surcharge_percent: f64,
}

/// Result of registering a coffee.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CoffeeReceipt {
    pub charge: CoffeeCharge,
    pub balance: f64,
    pub total_coffees: i64,
    pub logs: Vec<LogEntry>,
}

/// Result of a top-up or group purchase.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LedgerResult {
    pub log: LogEntry,
    pub group_funds: f64,
}

/// Result of a bean purchase.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct BeanPurchaseResult {
    pub log: LogEntry,
    pub pricing: BeanPricing,
    pub config: GlobalConfig,
}

/// Public view link for a stored receipt.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ReceiptUrlResponse {
    pub file_id: String,
    pub url: String,
}
