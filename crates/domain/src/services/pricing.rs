//! Coffee pricing.
//!
//! All charges are computed in whole cents and converted back to euros at
//! the edges.

use serde::{Deserialize, Serialize};
use shared::money::{format_eur, from_cents, percent_of_cents, round_cents, to_cents};
use thiserror::Error;

/// Error type for pricing calculations.
#[derive(Debug, Error, PartialEq)]
pub enum PricingError {
    #[error("Quantity must be positive: {0}")]
    InvalidQuantity(String),
}

/// What one coffee costs a member.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CoffeeCharge {
    pub price: f64,
    pub surcharge: f64,
    pub total: f64,
}

impl CoffeeCharge {
    pub fn has_surcharge(&self) -> bool {
        self.surcharge > 0.0
    }
}

/// Price one coffee for a member with the given balance.
///
/// A surcharge of `surcharge_percent` of the price is added when the
/// balance does not cover the price.
pub fn coffee_charge(balance: f64, price_per_cup: f64, surcharge_percent: f64) -> CoffeeCharge {
    let price_cents = to_cents(price_per_cup).max(0);
    let surcharge_cents = if to_cents(balance) < price_cents {
        percent_of_cents(price_cents, surcharge_percent.max(0.0))
    } else {
        0
    };

    CoffeeCharge {
        price: from_cents(price_cents),
        surcharge: from_cents(surcharge_cents),
        total: from_cents(price_cents + surcharge_cents),
    }
}

/// Unit prices derived from a bean purchase.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct BeanPricing {
    pub price_per_gram: f64,
    pub price_per_cup: f64,
}

impl BeanPricing {
    pub fn price_per_kg(&self) -> f64 {
        self.price_per_gram * 1000.0
    }
}

/// Derive per-gram and per-cup prices from a purchase of `grams` for `amount`.
pub fn bean_pricing(amount: f64, grams: f64, grams_per_cup: f64) -> Result<BeanPricing, PricingError> {
    if !(grams.is_finite() && grams > 0.0) {
        return Err(PricingError::InvalidQuantity(format!("grams = {}", grams)));
    }

    let price_per_gram = amount / grams;
    Ok(BeanPricing {
        price_per_gram,
        price_per_cup: price_per_cup(price_per_gram, grams_per_cup),
    })
}

/// Price of a cup at the given bean price and dose, rounded to cents.
pub fn price_per_cup(price_per_gram: f64, grams_per_cup: f64) -> f64 {
    round_cents(price_per_gram * grams_per_cup)
}

/// Log message describing a bean purchase.
pub fn bean_log_message(grams: f64, pricing: &BeanPricing) -> String {
    format!(
        "Coffee Beans: {}g @ {}/kg ({}/cup)",
        grams,
        format_eur(pricing.price_per_kg()),
        format_eur(pricing.price_per_cup)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_charge_with_surcharge_when_balance_short() {
        let charge = coffee_charge(0.30, 0.50, 50.0);
        assert_eq!(charge.price, 0.50);
        assert_eq!(charge.surcharge, 0.25);
        assert_eq!(charge.total, 0.75);
        assert!(charge.has_surcharge());
        assert_eq!(round_cents(0.30 - charge.total), -0.45);
    }

    #[test]
    fn test_no_surcharge_when_balance_covers_price() {
        let charge = coffee_charge(0.50, 0.50, 50.0);
        assert_eq!(charge.surcharge, 0.0);
        assert_eq!(charge.total, 0.50);
        assert!(!charge.has_surcharge());

        let charge = coffee_charge(10.0, 0.36, 50.0);
        assert_eq!(charge.total, 0.36);
    }

    #[test]
    fn test_zero_percent_surcharge() {
        let charge = coffee_charge(-5.0, 0.50, 0.0);
        assert_eq!(charge.surcharge, 0.0);
        assert_eq!(charge.total, 0.50);
    }

    #[test]
    fn test_bean_pricing() {
        let pricing = bean_pricing(18.0, 900.0, 18.0).unwrap();
        assert_eq!(pricing.price_per_gram, 0.02);
        assert_eq!(pricing.price_per_cup, 0.36);
        assert!((pricing.price_per_kg() - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_bean_pricing_rejects_zero_grams() {
        assert!(matches!(
            bean_pricing(18.0, 0.0, 18.0),
            Err(PricingError::InvalidQuantity(_))
        ));
        assert!(bean_pricing(18.0, f64::NAN, 18.0).is_err());
    }

    #[test]
    fn test_price_per_cup_default_rate() {
        assert_eq!(price_per_cup(0.0278, 18.0), 0.50);
        assert_eq!(price_per_cup(0.02, 20.0), 0.40);
    }

    #[test]
    fn test_bean_log_message() {
        let pricing = bean_pricing(18.0, 900.0, 18.0).unwrap();
        assert_eq!(
            bean_log_message(900.0, &pricing),
            "Coffee Beans: 900g @ €20.00/kg (€0.36/cup)"
        );
    }
}
