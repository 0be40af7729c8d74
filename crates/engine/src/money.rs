use std::fmt;

use crate::{Currency, EngineError, ResultEngine};

/// Signed money amount represented as **integer minor units** of a currency.
///
/// Balances, ledger entries and financial records all carry `i64` minor units;
/// `Money` is the type used at the edges (parsing user input, formatting
/// exports) so the number of decimals always follows the currency.
///
/// # Examples
///
/// ```rust
/// use engine::{Currency, Money};
///
/// let amount = Money::new(12_345, Currency::Omr);
/// assert_eq!(amount.amount_minor(), 12345);
/// assert_eq!(amount.to_string(), "12.345 OMR");
/// ```
///
/// Parsing accepts `.` or `,` as decimal separator and rejects more decimals
/// than the currency has:
///
/// ```rust
/// use engine::{Currency, Money};
///
/// assert_eq!(Money::parse("10", Currency::Omr).unwrap().amount_minor(), 10_000);
/// assert_eq!(Money::parse("10,5", Currency::Usd).unwrap().amount_minor(), 1050);
/// assert!(Money::parse("12.345", Currency::Usd).is_err());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Money {
    amount_minor: i64,
    currency: Currency,
}

impl Money {
    #[must_use]
    pub const fn new(amount_minor: i64, currency: Currency) -> Self {
        Self {
            amount_minor,
            currency,
        }
    }

    #[must_use]
    pub const fn amount_minor(self) -> i64 {
        self.amount_minor
    }

    #[must_use]
    pub const fn currency(self) -> Currency {
        self.currency
    }

    /// Formats the amount in major units without the currency code.
    #[must_use]
    pub fn format_major(self) -> String {
        let sign = if self.amount_minor < 0 { "-" } else { "" };
        let abs = self.amount_minor.unsigned_abs();
        let scale = self.currency.scale().unsigned_abs();
        let major = abs / scale;
        let minor = abs % scale;
        let width = usize::from(self.currency.minor_units());
        format!("{sign}{major}.{minor:0width$}")
    }

    /// Parses a decimal string in major units into minor units.
    ///
    /// Accepts an optional leading `+`/`-`.
    pub fn parse(input: &str, currency: Currency) -> ResultEngine<Self> {
        let empty = || EngineError::InvalidAmount("empty amount".to_string());
        let invalid = || EngineError::InvalidAmount("invalid amount".to_string());
        let overflow = || EngineError::InvalidAmount("amount too large".to_string());

        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(empty());
        }

        let (negative, rest) = if let Some(stripped) = trimmed.strip_prefix('-') {
            (true, stripped)
        } else if let Some(stripped) = trimmed.strip_prefix('+') {
            (false, stripped)
        } else {
            (false, trimmed)
        };

        let rest = rest.trim();
        if rest.is_empty() {
            return Err(empty());
        }

        let rest = rest.replace(',', ".");
        let mut parts = rest.split('.');
        let major_str = parts.next().ok_or_else(invalid)?;
        let minor_str = parts.next();
        if parts.next().is_some() {
            return Err(invalid());
        }

        if major_str.is_empty() || !major_str.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }
        let major: i64 = major_str.parse().map_err(|_| overflow())?;

        let digits = usize::from(currency.minor_units());
        let minor: i64 = match minor_str {
            None | Some("") => 0,
            Some(frac) => {
                if !frac.chars().all(|c| c.is_ascii_digit()) {
                    return Err(invalid());
                }
                if frac.len() > digits {
                    return Err(EngineError::InvalidAmount("too many decimals".to_string()));
                }
                let padded = format!("{frac:0<digits$}");
                padded.parse().map_err(|_| invalid())?
            }
        };

        let total = major
            .checked_mul(currency.scale())
            .and_then(|v| v.checked_add(minor))
            .ok_or_else(overflow)?;
        let amount_minor = if negative {
            total.checked_neg().ok_or_else(overflow)?
        } else {
            total
        };

        Ok(Self::new(amount_minor, currency))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.format_major(), self.currency.code())
    }
}
