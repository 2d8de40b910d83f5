//! Application services.

pub mod claim_exchange;
pub mod identity;
pub mod ledger;

pub use claim_exchange::{ClaimError, ClaimService};
pub use identity::{create_identity_service, AppwriteIdentityService, LocalIdentityService};
pub use ledger::{LedgerError, LedgerService};
