//! Ledger operations.
//!
//! Every transaction moves balances and the group pot with atomic
//! increments, then appends one log document per movement.

use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use domain::models::{
    AdminOverview, BeanPurchaseRequest, BeanPurchaseResult, CoffeeReceipt, CreateMemberRequest,
    ExpenseRequest, GlobalConfig, LedgerResult, Member, NewLogEntry, ReceiptUpload, TopUpRequest,
    UpdateGramsPerCupRequest, UpdateSurchargeRequest,
};
use domain::services::{
    bean_log_message, bean_pricing, coffee_charge, price_per_cup, PricingError,
};
use persistence::db::Repositories;
use persistence::storage::{FileStorage, FileUpload};
use persistence::store::StoreError;
use shared::crypto::generate_document_id;
use shared::money::round_cents;
use shared::validation::validate_amount;
use thiserror::Error;
use tracing::{info, warn};
use validator::Validate;

use crate::error::ApiError;
use crate::middleware::metrics::record_ledger_operation;

/// Shown when a receipt cannot be stored; the expense is not recorded.
pub const RECEIPT_UPLOAD_FAILED: &str = "Receipt upload failed. Expense not recorded.";

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    InvalidRequest(#[from] validator::ValidationErrors),

    #[error("Member {0} not found")]
    MemberNotFound(String),

    #[error("Invalid receipt: {0}")]
    InvalidReceipt(String),

    #[error("Receipt upload failed. Expense not recorded. ({0})")]
    ReceiptUpload(StoreError),

    #[error(transparent)]
    Pricing(#[from] PricingError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::Validation(msg) | LedgerError::InvalidReceipt(msg) => {
                ApiError::Validation(msg)
            }
            LedgerError::InvalidRequest(errors) => ApiError::from(errors),
            LedgerError::MemberNotFound(id) => ApiError::NotFound(format!("Member {} not found", id)),
            LedgerError::ReceiptUpload(e) => {
                warn!(error = %e, "Receipt upload failed");
                ApiError::Server(RECEIPT_UPLOAD_FAILED.to_string())
            }
            LedgerError::Pricing(e) => ApiError::Validation(e.to_string()),
            LedgerError::Store(e) => ApiError::from(e),
        }
    }
}

fn checked_amount(amount: f64) -> Result<f64, LedgerError> {
    validate_amount(amount).map_err(|e| {
        LedgerError::Validation(
            e.message
                .map(|m| m.to_string())
                .unwrap_or_else(|| "Invalid amount".to_string()),
        )
    })?;
    Ok(round_cents(amount))
}

/// Decode a base64 receipt, accepting `data:` URLs as well as bare payloads.
pub fn decode_receipt(receipt: &ReceiptUpload) -> Result<FileUpload, LedgerError> {
    let payload = match receipt.data.split_once(',') {
        Some((prefix, rest)) if prefix.starts_with("data:") => rest,
        _ => receipt.data.as_str(),
    };
    let bytes = STANDARD
        .decode(payload.trim())
        .map_err(|e| LedgerError::InvalidReceipt(e.to_string()))?;
    if bytes.is_empty() {
        return Err(LedgerError::InvalidReceipt("receipt is empty".into()));
    }

    Ok(FileUpload {
        filename: receipt.filename.clone(),
        content_type: receipt.content_type.clone(),
        bytes,
    })
}

/// Balance and pot mutations.
#[derive(Clone)]
pub struct LedgerService {
    repos: Repositories,
    files: Arc<dyn FileStorage>,
}

impl LedgerService {
    pub fn new(repos: Repositories, files: Arc<dyn FileStorage>) -> Self {
        Self { repos, files }
    }

    /// Charge one coffee to `member`.
    pub async fn register_coffee(&self, member: &Member) -> Result<CoffeeReceipt, LedgerError> {
        let config = self.repos.global_config.get().await?;
        let charge = coffee_charge(
            member.balance,
            config.coffee_price_per_cup,
            config.surcharge_percent,
        );

        let updated = self.repos.members.apply_coffee(&member.id, &charge).await?;

        let mut logs = vec![
            self.repos
                .logs
                .append(&NewLogEntry::coffee(member, charge.price))
                .await?,
        ];
        if charge.has_surcharge() {
            logs.push(
                self.repos
                    .logs
                    .append(&NewLogEntry::surcharge(
                        member,
                        charge.surcharge,
                        config.surcharge_percent,
                    ))
                    .await?,
            );
        }

        record_ledger_operation("coffee");
        info!(
            member_id = %member.id,
            price = charge.price,
            surcharge = charge.surcharge,
            balance = updated.balance,
            "Coffee registered"
        );

        Ok(CoffeeReceipt {
            charge,
            balance: updated.balance,
            total_coffees: updated.total_coffees,
            logs,
        })
    }

    /// Credit a member and the pot with a cash payment.
    pub async fn top_up(
        &self,
        member_id: &str,
        request: &TopUpRequest,
    ) -> Result<LedgerResult, LedgerError> {
        request.validate()?;
        let amount = checked_amount(request.amount)?;

        let member = self
            .repos
            .members
            .find(member_id)
            .await?
            .ok_or_else(|| LedgerError::MemberNotFound(member_id.to_string()))?;

        let updated = self.repos.members.credit(&member.id, amount).await?;
        let config = self.repos.global_config.adjust_funds(amount).await?;
        let message = request
            .message
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .map(String::from);
        let log = self
            .repos
            .logs
            .append(&NewLogEntry::top_up(&member, amount, message))
            .await?;

        record_ledger_operation("top_up");
        info!(member_id = %member.id, amount, balance = updated.balance, "Top-up recorded");

        Ok(LedgerResult {
            log,
            group_funds: config.group_funds,
        })
    }

    /// Pay a group expense from the pot.
    ///
    /// The receipt is stored first; if that fails nothing is recorded.
    pub async fn record_expense(&self, request: &ExpenseRequest) -> Result<LedgerResult, LedgerError> {
        request.validate()?;
        let amount = checked_amount(request.amount)?;
        let file_id = self.store_receipt(request.receipt.as_ref()).await?;

        let config = self.repos.global_config.adjust_funds(-amount).await?;
        let log = self
            .repos
            .logs
            .append(&NewLogEntry::expense(
                amount,
                request.message.trim().to_string(),
                file_id,
            ))
            .await?;

        record_ledger_operation("expense");
        info!(amount, group_funds = config.group_funds, "Expense recorded");

        Ok(LedgerResult {
            log,
            group_funds: config.group_funds,
        })
    }

    /// Pay for beans from the pot and reprice coffee from the purchase.
    pub async fn record_bean_purchase(
        &self,
        request: &BeanPurchaseRequest,
    ) -> Result<BeanPurchaseResult, LedgerError> {
        request.validate()?;
        let amount = checked_amount(request.amount)?;

        let current = self.repos.global_config.get_or_init().await?;
        let pricing = bean_pricing(amount, request.grams, current.grams_per_cup)?;
        let file_id = self.store_receipt(request.receipt.as_ref()).await?;

        self.repos
            .global_config
            .set_bean_pricing(pricing.price_per_gram, pricing.price_per_cup)
            .await?;
        let config = self.repos.global_config.adjust_funds(-amount).await?;
        let log = self
            .repos
            .logs
            .append(&NewLogEntry::beans(
                amount,
                bean_log_message(request.grams, &pricing),
                file_id,
            ))
            .await?;

        record_ledger_operation("beans");
        info!(
            amount,
            grams = request.grams,
            price_per_cup = pricing.price_per_cup,
            "Bean purchase recorded"
        );

        Ok(BeanPurchaseResult {
            log,
            pricing,
            config,
        })
    }

    /// Change the dose and reprice a cup at the current bean price.
    pub async fn update_grams_per_cup(
        &self,
        request: &UpdateGramsPerCupRequest,
    ) -> Result<GlobalConfig, LedgerError> {
        request.validate()?;
        let current = self.repos.global_config.get_or_init().await?;
        let per_cup = price_per_cup(current.coffee_price_per_gram, request.grams_per_cup);

        let config = self
            .repos
            .global_config
            .set_grams_per_cup(request.grams_per_cup, per_cup)
            .await?;
        info!(
            grams_per_cup = config.grams_per_cup,
            price_per_cup = config.coffee_price_per_cup,
            "Grams per cup updated"
        );
        Ok(config)
    }

    pub async fn update_surcharge(
        &self,
        request: &UpdateSurchargeRequest,
    ) -> Result<GlobalConfig, LedgerError> {
        request.validate()?;
        let config = self
            .repos
            .global_config
            .set_surcharge_percent(request.surcharge_percent)
            .await?;
        info!(surcharge_percent = config.surcharge_percent, "Surcharge updated");
        Ok(config)
    }

    pub async fn create_member(&self, request: &CreateMemberRequest) -> Result<Member, LedgerError> {
        request.validate()?;
        let member = self
            .repos
            .members
            .create(&generate_document_id(), request.name.trim())
            .await?;
        info!(member_id = %member.id, "Member created");
        Ok(member)
    }

    pub async fn overview(&self) -> Result<AdminOverview, LedgerError> {
        let members = self.repos.members.list().await?;
        let config = self.repos.global_config.get().await?;
        Ok(AdminOverview {
            members,
            group_funds: config.group_funds,
        })
    }

    async fn store_receipt(
        &self,
        receipt: Option<&ReceiptUpload>,
    ) -> Result<Option<String>, LedgerError> {
        let Some(receipt) = receipt else {
            return Ok(None);
        };
        let upload = decode_receipt(receipt)?;
        let file_id = self
            .files
            .upload(upload)
            .await
            .map_err(LedgerError::ReceiptUpload)?;
        Ok(Some(file_id))
    }
}
