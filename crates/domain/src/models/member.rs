//! Member domain model.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// A person on the tab.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Member {
    pub id: String,
    pub name: String,
    /// Signed euro balance; negative means the member owes the pot.
    pub balance: f64,
    pub total_coffees: i64,
    /// Canonical external identity linked through a claim.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub appwrite_uid: Option<String>,
    pub surcharge_total: f64,
}

impl Member {
    /// Whether `uid` is the device identity linked to this member.
    pub fn is_linked_to(&self, uid: &str) -> bool {
        self.appwrite_uid.as_deref() == Some(uid)
    }
}

/// Request to add a member to the tab.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct CreateMemberRequest {
    #[validate(length(min = 1, max = 64, message = "name must be between 1 and 64 characters"))]
    pub name: String,
}

/// Admin view over all members and the collective pot.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct AdminOverview {
    pub members: Vec<Member>,
    pub group_funds: f64,
}
