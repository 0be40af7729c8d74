use serde::{Deserialize, Serialize};

use crate::EngineError;

/// ISO currency code used by a deployment and its money values.
///
/// A Bursar deployment is mono-currency: the engine is built with one
/// `Currency` and every balance, ledger entry and financial record stores
/// that code next to its amount.
///
/// ## Minor units
///
/// Monetary values are stored as an `i64` number of **minor units** (see
/// `Money`). `minor_units()` returns how many decimal digits separate major
/// from minor units.
///
/// Example: OMR has 3 minor units (baisa), so `1.250 OMR` ⇄ `1250`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Omr,
    Usd,
    Eur,
}

impl Currency {
    /// Canonical currency code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Currency::Omr => "OMR",
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
        }
    }

    /// Number of fraction digits used when formatting/parsing amounts.
    #[must_use]
    pub const fn minor_units(self) -> u8 {
        match self {
            Currency::Omr => 3,
            Currency::Usd | Currency::Eur => 2,
        }
    }

    /// `10^minor_units`, the number of minor units in one major unit.
    #[must_use]
    pub const fn scale(self) -> i64 {
        match self.minor_units() {
            3 => 1000,
            _ => 100,
        }
    }
}

impl core::fmt::Display for Currency {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.code())
    }
}

impl TryFrom<&str> for Currency {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_uppercase().as_str() {
            "OMR" => Ok(Currency::Omr),
            "USD" => Ok(Currency::Usd),
            "EUR" => Ok(Currency::Eur),
            other => Err(EngineError::CurrencyMismatch(format!(
                "unsupported currency: {other}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_codes_case_insensitively() {
        assert_eq!(Currency::try_from("omr").unwrap(), Currency::Omr);
        assert_eq!(Currency::try_from(" EUR ").unwrap(), Currency::Eur);
        assert!(Currency::try_from("GBP").is_err());
    }

    #[test]
    fn scale_matches_minor_units() {
        assert_eq!(Currency::Omr.scale(), 1000);
        assert_eq!(Currency::Usd.scale(), 100);
    }
}
