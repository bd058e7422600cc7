//! Payment card checks run before handing a card to the payment processor.
//!
//! These are shape checks only (Luhn checksum, expiry, CVV length). Whether a
//! card can actually be charged is decided by the processor.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Shortest and longest card numbers accepted, in digits.
const CARD_NUMBER_LENGTH: core::ops::RangeInclusive<usize> = 13..=19;

/// Card network, detected from the number's leading digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardBrand {
    Visa,
    Mastercard,
    Amex,
    Discover,
    Unknown,
}

impl CardBrand {
    /// Detect the brand of a (possibly space-separated) card number.
    #[must_use]
    pub fn detect(number: &str) -> Self {
        let digits: String = number.chars().filter(|c| !c.is_whitespace()).collect();
        let prefix2 = digits.get(..2).and_then(|p| p.parse::<u8>().ok());

        if digits.starts_with('4') {
            Self::Visa
        } else if matches!(prefix2, Some(51..=55 | 22..=27)) {
            Self::Mastercard
        } else if matches!(prefix2, Some(34 | 37)) {
            Self::Amex
        } else if digits.starts_with("6011") || digits.starts_with("65") {
            Self::Discover
        } else {
            Self::Unknown
        }
    }

    /// Required CVV length for the brand.
    #[must_use]
    pub const fn cvv_length(self) -> usize {
        match self {
            Self::Amex => 4,
            _ => 3,
        }
    }
}

/// Validate a card number with the Luhn checksum.
///
/// Whitespace is ignored; any other non-digit character fails the check, as
/// does a length outside 13–19 digits.
#[must_use]
pub fn luhn_valid(number: &str) -> bool {
    let digits: Vec<u32> = match number
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| c.to_digit(10))
        .collect::<Option<Vec<_>>>()
    {
        Some(digits) => digits,
        None => return false,
    };

    if !CARD_NUMBER_LENGTH.contains(&digits.len()) {
        return false;
    }

    let sum: u32 = digits
        .iter()
        .rev()
        .enumerate()
        .map(|(i, &d)| {
            if i % 2 == 1 {
                let doubled = d * 2;
                if doubled > 9 { doubled - 9 } else { doubled }
            } else {
                d
            }
        })
        .sum();

    sum % 10 == 0
}

/// Check a CVV against the length the card brand requires.
#[must_use]
pub fn cvv_valid(cvv: &str, brand: CardBrand) -> bool {
    !cvv.is_empty() && cvv.chars().all(|c| c.is_ascii_digit()) && cvv.len() == brand.cvv_length()
}

/// Group a card number for display: Amex as 4-6-5, everything else in fours.
///
/// Non-digit characters are dropped first.
#[must_use]
pub fn format_card_number(value: &str) -> String {
    let digits: String = value.chars().filter(char::is_ascii_digit).collect();

    if CardBrand::detect(&digits) == CardBrand::Amex {
        if digits.len() < 15 {
            return digits;
        }
        let (first, rest) = digits.split_at(4);
        let (second, third) = rest.split_at(6);
        return format!("{first} {second} {third}");
    }

    digits
        .as_bytes()
        .chunks(4)
        .map(|chunk| String::from_utf8_lossy(chunk).into_owned())
        .collect::<Vec<_>>()
        .join(" ")
}

/// A card expiry date written as `MM/YY`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpiryDate {
    pub month: u32,
    /// Four-digit year.
    pub year: i32,
}

impl ExpiryDate {
    /// Parse `MM/YY`. Returns `None` for malformed input or a month outside 1–12.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        let (month, year) = s.trim().split_once('/')?;
        let month = month.trim();
        let year = year.trim();

        if month.is_empty()
            || month.len() > 2
            || year.len() != 2
            || !month.chars().chain(year.chars()).all(|c| c.is_ascii_digit())
        {
            return None;
        }

        let month: u32 = month.parse().ok()?;
        if !(1..=12).contains(&month) {
            return None;
        }
        let year = 2000 + year.parse::<i32>().ok()?;

        Some(Self { month, year })
    }

    /// Whether the card is still usable in the month containing `today`.
    ///
    /// A card expiring this month is still valid.
    #[must_use]
    pub fn is_valid_on(&self, today: NaiveDate) -> bool {
        (self.year, self.month) >= (today.year(), today.month())
    }
}

/// Result of running every card check at once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardCheck {
    pub brand: CardBrand,
    pub formatted_number: String,
    pub number_valid: bool,
    pub expiry_valid: bool,
    pub cvv_valid: bool,
}

impl CardCheck {
    /// Run the number, expiry, and CVV checks.
    #[must_use]
    pub fn run(number: &str, expiry: &str, cvv: &str, today: NaiveDate) -> Self {
        let brand = CardBrand::detect(number);
        Self {
            brand,
            formatted_number: format_card_number(number),
            number_valid: luhn_valid(number),
            expiry_valid: ExpiryDate::parse(expiry).is_some_and(|e| e.is_valid_on(today)),
            cvv_valid: cvv_valid(cvv, brand),
        }
    }

    /// All checks passed.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.number_valid && self.expiry_valid && self.cvv_valid
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, 15).unwrap()
    }

    #[test]
    fn test_detect_brand() {
        assert_eq!(CardBrand::detect("4242 4242 4242 4242"), CardBrand::Visa);
        assert_eq!(CardBrand::detect("5555555555554444"), CardBrand::Mastercard);
        assert_eq!(CardBrand::detect("2223003122003222"), CardBrand::Mastercard);
        assert_eq!(CardBrand::detect("378282246310005"), CardBrand::Amex);
        assert_eq!(CardBrand::detect("6011111111111117"), CardBrand::Discover);
        assert_eq!(CardBrand::detect("6500000000000002"), CardBrand::Discover);
        assert_eq!(CardBrand::detect("9999"), CardBrand::Unknown);
        assert_eq!(CardBrand::detect(""), CardBrand::Unknown);
    }

    #[test]
    fn test_luhn() {
        assert!(luhn_valid("4242 4242 4242 4242"));
        assert!(luhn_valid("378282246310005"));
        assert!(!luhn_valid("4242 4242 4242 4241"));
        assert!(!luhn_valid("4242-4242-4242-4242"));
        // Too short even though the checksum passes
        assert!(!luhn_valid("0"));
        assert!(!luhn_valid("42424242424242424242"));
    }

    #[test]
    fn test_cvv() {
        assert!(cvv_valid("123", CardBrand::Visa));
        assert!(!cvv_valid("1234", CardBrand::Visa));
        assert!(cvv_valid("1234", CardBrand::Amex));
        assert!(!cvv_valid("12a", CardBrand::Mastercard));
        assert!(!cvv_valid("", CardBrand::Unknown));
    }

    #[test]
    fn test_format_card_number() {
        assert_eq!(format_card_number("4242424242424242"), "4242 4242 4242 4242");
        assert_eq!(format_card_number("4242-4242-42"), "4242 4242 42");
        assert_eq!(format_card_number("378282246310005"), "3782 822463 10005");
        assert_eq!(format_card_number("3782"), "3782");
    }

    #[test]
    fn test_expiry_parse() {
        assert_eq!(
            ExpiryDate::parse("09/27"),
            Some(ExpiryDate {
                month: 9,
                year: 2027
            })
        );
        assert!(ExpiryDate::parse("13/27").is_none());
        assert!(ExpiryDate::parse("00/27").is_none());
        assert!(ExpiryDate::parse("0927").is_none());
        assert!(ExpiryDate::parse("09/2027").is_none());
        assert!(ExpiryDate::parse("ab/cd").is_none());
    }

    #[test]
    fn test_expiry_against_today() {
        let expiry = ExpiryDate::parse("06/26").unwrap();
        assert!(expiry.is_valid_on(date(2026, 6)));
        assert!(expiry.is_valid_on(date(2025, 12)));
        assert!(!expiry.is_valid_on(date(2026, 7)));
        assert!(!expiry.is_valid_on(date(2027, 1)));
    }

    #[test]
    fn test_card_check_run() {
        let check = CardCheck::run("4242 4242 4242 4242", "12/30", "123", date(2026, 10));
        assert_eq!(check.brand, CardBrand::Visa);
        assert!(check.is_valid());

        let check = CardCheck::run("378282246310005", "01/20", "123", date(2026, 10));
        assert_eq!(check.brand, CardBrand::Amex);
        assert!(check.number_valid);
        assert!(!check.expiry_valid);
        assert!(!check.cvv_valid);
        assert!(!check.is_valid());
    }
}
