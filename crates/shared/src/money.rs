//! Currency arithmetic.
//!
//! Amounts are stored as floating point euros in the document database.
//! Calculations go through whole cents so charges like `0.50 + 25%` come out
//! exact instead of accumulating binary rounding noise.

/// Converts a euro amount to whole cents, rounding half away from zero.
pub fn to_cents(amount: f64) -> i64 {
    (amount * 100.0).round() as i64
}

/// Converts whole cents back to a euro amount.
pub fn from_cents(cents: i64) -> f64 {
    cents as f64 / 100.0
}

/// Rounds a euro amount to the nearest cent.
pub fn round_cents(amount: f64) -> f64 {
    from_cents(to_cents(amount))
}

/// Computes `percent` percent of `cents`, rounded to the nearest cent.
pub fn percent_of_cents(cents: i64, percent: f64) -> i64 {
    (cents as f64 * percent / 100.0).round() as i64
}

/// Formats an amount with two decimals and the euro sign.
pub fn format_eur(amount: f64) -> String {
    format!("€{:.2}", amount)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_cents() {
        assert_eq!(to_cents(0.5), 50);
        assert_eq!(to_cents(0.3), 30);
        assert_eq!(to_cents(-0.45), -45);
        assert_eq!(to_cents(18.0), 1800);
        assert_eq!(to_cents(0.0278 * 18.0), 50);
    }

    #[test]
    fn test_round_cents() {
        assert_eq!(round_cents(0.02 * 18.0), 0.36);
        assert_eq!(round_cents(0.30 - 0.75), -0.45);
        assert_eq!(round_cents(1.005), 1.0);
    }

    #[test]
    fn test_percent_of_cents() {
        assert_eq!(percent_of_cents(50, 50.0), 25);
        assert_eq!(percent_of_cents(50, 0.0), 0);
        assert_eq!(percent_of_cents(36, 10.0), 4);
        assert_eq!(percent_of_cents(50, 100.0), 50);
    }

    #[test]
    fn test_format_eur() {
        assert_eq!(format_eur(0.5), "€0.50");
        assert_eq!(format_eur(-0.45), "€-0.45");
        assert_eq!(format_eur(20.0), "€20.00");
    }
}
