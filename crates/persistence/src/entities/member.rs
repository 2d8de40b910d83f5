//! Member document.

use domain::models::Member;
use serde::{Deserialize, Serialize};

/// Member document as stored.
#[derive(Debug, Clone, Deserialize)]
pub struct MemberEntity {
    #[serde(rename = "$id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub balance: Option<f64>,
    #[serde(default)]
    pub total_coffees: Option<i64>,
    #[serde(default)]
    pub appwrite_uid: Option<String>,
    #[serde(default)]
    pub surcharge_total: Option<f64>,
}

impl From<MemberEntity> for Member {
    fn from(entity: MemberEntity) -> Self {
        Member {
            id: entity.id,
            name: entity.name,
            balance: entity.balance.unwrap_or(0.0),
            total_coffees: entity.total_coffees.unwrap_or(0),
            appwrite_uid: entity.appwrite_uid.filter(|uid| !uid.is_empty()),
            surcharge_total: entity.surcharge_total.unwrap_or(0.0),
        }
    }
}

/// Fields written when a member is created.
#[derive(Debug, Serialize)]
pub struct NewMemberDocument<'a> {
    pub name: &'a str,
    pub balance: f64,
    pub total_coffees: i64,
    pub surcharge_total: f64,
}

impl<'a> NewMemberDocument<'a> {
    pub fn new(name: &'a str) -> Self {
        Self {
            name,
            balance: 0.0,
            total_coffees: 0,
            surcharge_total: 0.0,
        }
    }
}
