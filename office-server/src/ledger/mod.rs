//! Cash ledger primitives
//!
//! Currency conversion and guard checks shared by the collector and company
//! ledgers. Everything is stored in LBP; USD entries are converted at the
//! configured rate when recorded.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default USD→LBP exchange rate, overridable via `USD_LBP_RATE`
pub const DEFAULT_USD_LBP_RATE: f64 = 90_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Lbp,
    Usd,
}

impl Currency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Lbp => "LBP",
            Self::Usd => "USD",
        }
    }
}

impl std::str::FromStr for Currency {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "LBP" => Ok(Self::Lbp),
            "USD" => Ok(Self::Usd),
            other => Err(LedgerError::InvalidCurrency(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LedgerError {
    #[error("Amount must be a positive finite number, got {0}")]
    InvalidAmount(f64),

    #[error("Unknown currency: {0}")]
    InvalidCurrency(String),
}

pub type LedgerResult<T> = Result<T, LedgerError>;

/// Validate a ledger amount: positive, finite
pub fn validate_amount(amount: f64) -> LedgerResult<f64> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(LedgerError::InvalidAmount(amount));
    }
    Ok(amount)
}

/// Convert an amount to LBP at the given USD rate
pub fn lbp_equivalent(amount: f64, currency: Currency, usd_rate: f64) -> f64 {
    match currency {
        Currency::Lbp => amount,
        Currency::Usd => amount * usd_rate,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usd_converts_at_rate() {
        assert_eq!(lbp_equivalent(100.0, Currency::Usd, 90_000.0), 9_000_000.0);
        assert_eq!(lbp_equivalent(5000.0, Currency::Lbp, 90_000.0), 5000.0);
    }

    #[test]
    fn amounts_must_be_positive_finite() {
        assert!(validate_amount(1.0).is_ok());
        assert!(validate_amount(0.0).is_err());
        assert!(validate_amount(-3.0).is_err());
        assert!(validate_amount(f64::INFINITY).is_err());
        assert!(validate_amount(f64::NAN).is_err());
    }

    #[test]
    fn currency_parsing_is_case_insensitive() {
        assert_eq!("usd".parse::<Currency>().unwrap(), Currency::Usd);
        assert_eq!("LBP".parse::<Currency>().unwrap(), Currency::Lbp);
        assert!("EUR".parse::<Currency>().is_err());
    }
}
