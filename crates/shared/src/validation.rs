//! Common validation utilities.

use validator::ValidationError;

/// Maximum length of a custom document id in the hosted database.
pub const MAX_DOCUMENT_ID_LEN: usize = 36;

/// Largest single amount accepted for a ledger operation.
pub const MAX_LEDGER_AMOUNT: f64 = 10_000.0;

/// Validates a custom document id: 1-36 chars of `a-zA-Z0-9._-`,
/// not starting with a special character.
pub fn validate_document_id(id: &str) -> Result<(), ValidationError> {
    let valid_len = !id.is_empty() && id.len() <= MAX_DOCUMENT_ID_LEN;
    let valid_chars = id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));
    let valid_start = id.chars().next().is_some_and(|c| c.is_ascii_alphanumeric());

    if valid_len && valid_chars && valid_start {
        Ok(())
    } else {
        let mut err = ValidationError::new("document_id");
        err.message = Some("Id must be 1-36 characters of a-z, A-Z, 0-9, '.', '_' or '-'".into());
        Err(err)
    }
}

/// Validates that a ledger amount is a finite, positive number of bounded size.
pub fn validate_amount(amount: f64) -> Result<(), ValidationError> {
    if amount.is_finite() && amount > 0.0 && amount <= MAX_LEDGER_AMOUNT {
        Ok(())
    } else {
        let mut err = ValidationError::new("amount_range");
        err.message = Some("Amount must be greater than 0 and at most 10000".into());
        Err(err)
    }
}

/// Validates that a percentage is within 0 to 100.
pub fn validate_percent(percent: f64) -> Result<(), ValidationError> {
    if percent.is_finite() && (0.0..=100.0).contains(&percent) {
        Ok(())
    } else {
        let mut err = ValidationError::new("percent_range");
        err.message = Some("Percentage must be between 0 and 100".into());
        Err(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_document_id() {
        assert!(validate_document_id("main").is_ok());
        assert!(validate_document_id("65f1a2b3c4d5e6f7a8b9").is_ok());
        assert!(validate_document_id("member_1.a-b").is_ok());
        assert!(validate_document_id(&"a".repeat(36)).is_ok());
    }

    #[test]
    fn test_validate_document_id_rejects() {
        assert!(validate_document_id("").is_err());
        assert!(validate_document_id(&"a".repeat(37)).is_err());
        assert!(validate_document_id("_leading").is_err());
        assert!(validate_document_id("has space").is_err());
        assert!(validate_document_id("../etc").is_err());
        assert!(validate_document_id("a/b").is_err());
    }

    #[test]
    fn test_validate_amount() {
        assert!(validate_amount(0.01).is_ok());
        assert!(validate_amount(18.0).is_ok());
        assert!(validate_amount(10_000.0).is_ok());
        assert!(validate_amount(0.0).is_err());
        assert!(validate_amount(-1.0).is_err());
        assert!(validate_amount(f64::NAN).is_err());
        assert!(validate_amount(f64::INFINITY).is_err());
        assert!(validate_amount(10_000.01).is_err());
    }

    #[test]
    fn test_validate_percent() {
        assert!(validate_percent(0.0).is_ok());
        assert!(validate_percent(50.0).is_ok());
        assert!(validate_percent(100.0).is_ok());
        assert!(validate_percent(-0.1).is_err());
        assert!(validate_percent(100.1).is_err());
    }

    #[test]
    fn test_validate_amount_error_message() {
        let err = validate_amount(0.0).unwrap_err();
        assert_eq!(
            err.message.unwrap().to_string(),
            "Amount must be greater than 0 and at most 10000"
        );
    }
}
