//! Type-safe price representation using decimal arithmetic.
//!
//! Catalog prices are decimal amounts in a currency's standard unit. The
//! payment processor works in minor units (e.g. kuruş, cents), so [`Price`]
//! converts both ways with half-away-from-zero rounding.

use core::fmt;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Number of minor units in one standard unit for every supported currency.
const MINOR_UNITS_PER_UNIT: i64 = 100;

/// A price with currency information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Price {
    /// Amount in the currency's standard unit (e.g., lira, not kuruş).
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency_code: CurrencyCode,
}

impl Price {
    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal, currency_code: CurrencyCode) -> Self {
        Self {
            amount,
            currency_code,
        }
    }

    /// Create a price from an amount in minor units (e.g. `1250` → `12.50`).
    #[must_use]
    pub fn from_minor_units(minor: i64, currency_code: CurrencyCode) -> Self {
        Self::new(Decimal::new(minor, 2), currency_code)
    }

    /// Amount in minor units, rounded half away from zero.
    ///
    /// Returns `None` if the amount does not fit in an `i64`.
    #[must_use]
    pub fn to_minor_units(&self) -> Option<i64> {
        (self.amount * Decimal::from(MINOR_UNITS_PER_UNIT))
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .to_i64()
    }

    /// Format for display (e.g., `"₺19.99"`).
    #[must_use]
    pub fn display(&self) -> String {
        let rounded = self
            .amount
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        format!("{}{:.2}", self.currency_code.symbol(), rounded)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

/// ISO 4217 currency codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CurrencyCode {
    #[default]
    TRY,
    USD,
    EUR,
    GBP,
    CAD,
    AUD,
}

impl CurrencyCode {
    /// Display symbol for the currency.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::TRY => "₺",
            Self::USD | Self::CAD | Self::AUD => "$",
            Self::EUR => "€",
            Self::GBP => "£",
        }
    }

    /// Lowercase ISO code, as the payment processor expects it.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::TRY => "try",
            Self::USD => "usd",
            Self::EUR => "eur",
            Self::GBP => "gbp",
            Self::CAD => "cad",
            Self::AUD => "aud",
        }
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl std::str::FromStr for CurrencyCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "try" => Ok(Self::TRY),
            "usd" => Ok(Self::USD),
            "eur" => Ok(Self::EUR),
            "gbp" => Ok(Self::GBP),
            "cad" => Ok(Self::CAD),
            "aud" => Ok(Self::AUD),
            other => Err(format!("unsupported currency: {other}")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_display_two_decimals() {
        let price = Price::new(Decimal::new(1999, 2), CurrencyCode::USD);
        assert_eq!(price.display(), "$19.99");

        let price = Price::new(Decimal::new(5, 0), CurrencyCode::TRY);
        assert_eq!(price.to_string(), "₺5.00");
    }

    #[test]
    fn test_display_rounds_half_away_from_zero() {
        let price = Price::new(Decimal::new(10_005, 3), CurrencyCode::EUR);
        assert_eq!(price.display(), "€10.01");
    }

    #[test]
    fn test_to_minor_units() {
        let price = Price::new(Decimal::new(50, 2), CurrencyCode::TRY);
        assert_eq!(price.to_minor_units(), Some(50));

        let price = Price::new(Decimal::new(109_955, 3), CurrencyCode::TRY);
        assert_eq!(price.to_minor_units(), Some(10_996));
    }

    #[test]
    fn test_from_minor_units() {
        let price = Price::from_minor_units(1250, CurrencyCode::GBP);
        assert_eq!(price.amount, Decimal::new(1250, 2));
        assert_eq!(price.display(), "£12.50");
    }

    #[test]
    fn test_currency_parse() {
        assert_eq!("TRY".parse::<CurrencyCode>().unwrap(), CurrencyCode::TRY);
        assert_eq!(" usd ".parse::<CurrencyCode>().unwrap(), CurrencyCode::USD);
        assert!("xyz".parse::<CurrencyCode>().is_err());
    }

    #[test]
    fn test_currency_serde_lowercase() {
        let json = serde_json::to_string(&CurrencyCode::EUR).unwrap();
        assert_eq!(json, "\"eur\"");
    }
}
