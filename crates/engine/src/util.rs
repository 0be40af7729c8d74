//! Internal helpers for model validation and conversion.
//!
//! These utilities are **not** part of the public API. They centralize
//! validation and mapping logic so the engine enforces consistent invariants.

use unicode_normalization::UnicodeNormalization;
use uuid::Uuid;

use crate::{Currency, EngineError, ResultEngine};

/// Parse a UUID from storage and return a labeled error on failure.
pub(crate) fn parse_uuid(value: &str, label: &str) -> ResultEngine<Uuid> {
    Uuid::parse_str(value).map_err(|_| EngineError::InvalidId(format!("invalid {label} id")))
}

/// Parse a currency code stored in the DB into a strongly typed `Currency`.
pub(crate) fn model_currency(value: &str) -> ResultEngine<Currency> {
    Currency::try_from(value)
        .map_err(|_| EngineError::CurrencyMismatch(format!("invalid currency: {value}")))
}

/// Ensure a stored currency matches the engine currency.
pub(crate) fn ensure_currency(expected: Currency, actual: Currency) -> ResultEngine<()> {
    if expected != actual {
        return Err(EngineError::CurrencyMismatch(format!(
            "engine currency is {}, got {}",
            expected.code(),
            actual.code()
        )));
    }
    Ok(())
}

/// Largest amount a single movement, record or wallet balance may carry
/// (10^15 minor units, one trillion OMR).
pub const MAX_AMOUNT_MINOR: i64 = 1_000_000_000_000_000;

/// Rejects zero/negative amounts and amounts above [`MAX_AMOUNT_MINOR`].
pub(crate) fn ensure_positive(amount_minor: i64) -> ResultEngine<()> {
    if amount_minor <= 0 {
        return Err(EngineError::InvalidAmount(
            "amount_minor must be > 0".to_string(),
        ));
    }
    if amount_minor > MAX_AMOUNT_MINOR {
        return Err(EngineError::InvalidAmount(format!(
            "amount_minor must be <= {MAX_AMOUNT_MINOR}"
        )));
    }
    Ok(())
}

/// Trims and NFC-normalizes free text, so the same name typed with different
/// Unicode compositions (common in Arabic input) is stored and searched the
/// same way.
pub(crate) fn normalize_text(value: &str) -> String {
    value.trim().nfc().collect()
}

pub(crate) fn normalize_required(value: &str, label: &str) -> ResultEngine<String> {
    let normalized = normalize_text(value);
    if normalized.is_empty() {
        return Err(EngineError::Validation(format!(
            "{label} must not be empty"
        )));
    }
    Ok(normalized)
}

pub(crate) fn normalize_optional(value: Option<&str>) -> Option<String> {
    value.map(normalize_text).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_text_composes_and_trims() {
        // "e" + combining acute accent composes to a single code point.
        assert_eq!(normalize_text("  Jose\u{0301} "), "Jos\u{00e9}");
    }

    #[test]
    fn optional_blank_becomes_none() {
        assert_eq!(normalize_optional(Some("   ")), None);
        assert_eq!(normalize_optional(None), None);
        assert_eq!(normalize_optional(Some(" a ")), Some("a".to_string()));
    }

    #[test]
    fn amounts_are_bounded() {
        assert!(ensure_positive(1).is_ok());
        assert!(ensure_positive(MAX_AMOUNT_MINOR).is_ok());
        assert!(matches!(ensure_positive(0), Err(EngineError::InvalidAmount(_))));
        assert!(matches!(
            ensure_positive(MAX_AMOUNT_MINOR + 1),
            Err(EngineError::InvalidAmount(_))
        ));
        assert!(matches!(ensure_positive(i64::MAX), Err(EngineError::InvalidAmount(_))));
    }

    #[test]
    fn required_rejects_blank() {
        assert!(normalize_required(" ", "full name").is_err());
    }
}
