//! Global configuration singleton document.

use domain::models::GlobalConfig;
use serde::{Deserialize, Serialize};

/// Singleton document as stored.
///
/// Every field may be missing on a freshly created database.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GlobalConfigEntity {
    #[serde(default)]
    pub group_funds: Option<f64>,
    #[serde(default)]
    pub grams_per_cup: Option<f64>,
    #[serde(default)]
    pub coffee_price_per_cup: Option<f64>,
    #[serde(default)]
    pub coffee_price_per_gram: Option<f64>,
    #[serde(default)]
    pub surcharge_percent: Option<f64>,
}

/// Pricing fields must be positive to be usable.
fn positive_or(value: Option<f64>, fallback: f64) -> f64 {
    value.filter(|v| *v > 0.0).unwrap_or(fallback)
}

impl From<GlobalConfigEntity> for GlobalConfig {
    fn from(entity: GlobalConfigEntity) -> Self {
        let defaults = GlobalConfig::default();
        GlobalConfig {
            group_funds: entity.group_funds.unwrap_or(defaults.group_funds),
            grams_per_cup: positive_or(entity.grams_per_cup, defaults.grams_per_cup),
            coffee_price_per_cup: positive_or(
                entity.coffee_price_per_cup,
                defaults.coffee_price_per_cup,
            ),
            coffee_price_per_gram: positive_or(
                entity.coffee_price_per_gram,
                defaults.coffee_price_per_gram,
            ),
            surcharge_percent: entity
                .surcharge_percent
                .filter(|p| *p >= 0.0)
                .unwrap_or(defaults.surcharge_percent),
        }
    }
}

/// Full document written when the singleton is initialised.
#[derive(Debug, Serialize)]
pub struct GlobalConfigDocument {
    pub group_funds: f64,
    pub grams_per_cup: f64,
    pub coffee_price_per_cup: f64,
    pub coffee_price_per_gram: f64,
    pub surcharge_percent: f64,
}

impl From<&GlobalConfig> for GlobalConfigDocument {
    fn from(config: &GlobalConfig) -> Self {
        Self {
            group_funds: config.group_funds,
            grams_per_cup: config.grams_per_cup,
            coffee_price_per_cup: config.coffee_price_per_cup,
            coffee_price_per_gram: config.coffee_price_per_gram,
            surcharge_percent: config.surcharge_percent,
        }
    }
}
