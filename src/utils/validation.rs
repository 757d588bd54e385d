//! Validation utilities for the caller boundary
//!
//! The pure engine assumes its inputs are already well-formed; these checks
//! belong in front of it, where the service applies them.

use crate::traits::RecordValidator;
use crate::types::{JobSettings, ReconError, ReconResult, TransactionRecord};

/// Validate job settings before a run
pub fn validate_settings(settings: &JobSettings) -> ReconResult<()> {
    if settings.amount_tolerance_cents < 0 {
        return Err(ReconError::Validation(
            "Amount tolerance cannot be negative".to_string(),
        ));
    }

    if !settings.time_window_hours.is_finite() || settings.time_window_hours < 0.0 {
        return Err(ReconError::Validation(
            "Time window must be a non-negative number of hours".to_string(),
        ));
    }

    if settings.fuzzy_threshold > 100 {
        return Err(ReconError::Validation(
            "Fuzzy threshold must be between 0 and 100".to_string(),
        ));
    }

    if settings.max_rows == 0 {
        return Err(ReconError::Validation(
            "Row cap must be at least 1".to_string(),
        ));
    }

    Ok(())
}

/// Validate that a record ID is valid
pub fn validate_record_id(record_id: &str) -> ReconResult<()> {
    if record_id.trim().is_empty() {
        return Err(ReconError::Validation(
            "Record ID cannot be empty".to_string(),
        ));
    }

    if record_id.len() > 64 {
        return Err(ReconError::Validation(
            "Record ID cannot exceed 64 characters".to_string(),
        ));
    }

    // Check for valid characters (alphanumeric, dashes, underscores)
    if !record_id
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ReconError::Validation(
            "Record ID can only contain alphanumeric characters, dashes, and underscores"
                .to_string(),
        ));
    }

    Ok(())
}

/// Validate that a currency code looks like ISO 4217
pub fn validate_currency_code(code: &str) -> ReconResult<()> {
    if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(ReconError::Validation(format!(
            "Currency code '{}' is not a three-letter ISO code",
            code
        )));
    }

    Ok(())
}

/// Validate that both input lists share a single currency
///
/// Multi-currency conversion is out of scope; mixed inputs are a caller
/// defect, not something the comparators should paper over.
pub fn validate_single_currency(
    payouts: &[TransactionRecord],
    ledger: &[TransactionRecord],
) -> ReconResult<()> {
    let mut expected: Option<&str> = None;
    for record in payouts.iter().chain(ledger.iter()) {
        match expected {
            None => expected = Some(record.currency.as_str()),
            Some(currency) if currency != record.currency => {
                return Err(ReconError::Validation(format!(
                    "Record '{}' is in {} but the job is in {}",
                    record.id, record.currency, currency
                )));
            }
            Some(_) => {}
        }
    }

    Ok(())
}

/// Enhanced record validator with detailed checks
pub struct EnhancedRecordValidator;

impl RecordValidator for EnhancedRecordValidator {
    fn validate_record(&self, record: &TransactionRecord) -> ReconResult<()> {
        validate_record_id(&record.id)?;
        validate_currency_code(&record.currency)?;

        Ok(())
    }

    fn validate_batch(&self, records: &[TransactionRecord]) -> ReconResult<()> {
        for record in records {
            self.validate_record(record)?;
        }

        // A single list must also be internally consistent on currency.
        validate_single_currency(records, &[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_bounds() {
        assert!(validate_settings(&JobSettings::default()).is_ok());

        let negative_tolerance = JobSettings {
            amount_tolerance_cents: -1,
            ..JobSettings::default()
        };
        assert!(validate_settings(&negative_tolerance).is_err());

        let negative_window = JobSettings {
            time_window_hours: -0.5,
            ..JobSettings::default()
        };
        assert!(validate_settings(&negative_window).is_err());

        let wild_threshold = JobSettings {
            fuzzy_threshold: 101,
            ..JobSettings::default()
        };
        assert!(validate_settings(&wild_threshold).is_err());

        let no_rows = JobSettings {
            max_rows: 0,
            ..JobSettings::default()
        };
        assert!(validate_settings(&no_rows).is_err());
    }

    #[test]
    fn test_record_id_rules() {
        assert!(validate_record_id("po_2024-03-001").is_ok());
        assert!(validate_record_id("").is_err());
        assert!(validate_record_id("id with spaces").is_err());
        assert!(validate_record_id(&"x".repeat(65)).is_err());
    }

    #[test]
    fn test_currency_code_rules() {
        assert!(validate_currency_code("USD").is_ok());
        assert!(validate_currency_code("usd").is_ok());
        assert!(validate_currency_code("US").is_err());
        assert!(validate_currency_code("U5D").is_err());
    }

    #[test]
    fn test_single_currency_check() {
        let payouts = vec![TransactionRecord::payout("p1", 1_000, "USD")];
        let ledger = vec![TransactionRecord::ledger_entry("l1", -1_000, "USD")];
        assert!(validate_single_currency(&payouts, &ledger).is_ok());

        let mixed = vec![TransactionRecord::ledger_entry("l2", -1_000, "EUR")];
        assert!(validate_single_currency(&payouts, &mixed).is_err());
    }

    #[test]
    fn test_enhanced_validator() {
        let validator = EnhancedRecordValidator;

        let records = vec![
            TransactionRecord::payout("p1", 1_000, "USD"),
            TransactionRecord::payout("p2", 2_000, "USD"),
        ];
        assert!(validator.validate_batch(&records).is_ok());

        let mixed = vec![
            TransactionRecord::payout("p1", 1_000, "USD"),
            TransactionRecord::payout("p2", 2_000, "EUR"),
        ];
        assert!(validator.validate_batch(&mixed).is_err());
    }
}
