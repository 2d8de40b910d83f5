//! Global configuration singleton: the collective pot and pricing.

use serde::{Deserialize, Serialize};

/// Document id of the singleton.
pub const GLOBAL_CONFIG_ID: &str = "main";

pub const DEFAULT_GRAMS_PER_CUP: f64 = 18.0;
pub const DEFAULT_PRICE_PER_CUP: f64 = 0.50;
/// 0.50 per 18g cup.
pub const DEFAULT_PRICE_PER_GRAM: f64 = 0.0278;
pub const DEFAULT_SURCHARGE_PERCENT: f64 = 0.0;

/// Pot balance and pricing shared by the whole group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct GlobalConfig {
    pub group_funds: f64,
    pub grams_per_cup: f64,
    pub coffee_price_per_cup: f64,
    pub coffee_price_per_gram: f64,
    pub surcharge_percent: f64,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            group_funds: 0.0,
            grams_per_cup: DEFAULT_GRAMS_PER_CUP,
            coffee_price_per_cup: DEFAULT_PRICE_PER_CUP,
            coffee_price_per_gram: DEFAULT_PRICE_PER_GRAM,
            surcharge_percent: DEFAULT_SURCHARGE_PERCENT,
        }
    }
}
