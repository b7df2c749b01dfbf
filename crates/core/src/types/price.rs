//! Price representation using decimal arithmetic.
//!
//! Amounts arrive from the backend either as JSON numbers (`1200`) or as
//! decimal strings (`"1200.00"`); `rust_decimal` accepts both. Prices are
//! only ever displayed here, never summed: totals come from the backend.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// A price with currency information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Amount in the currency's standard unit (e.g., yen, dollars).
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

    /// Create a price in the shop's default currency.
    #[must_use]
    pub fn from_amount(amount: Decimal) -> Self {
        Self::new(amount, CurrencyCode::default())
    }

    /// Format for display, e.g. `¥1,200` or `$19.99`.
    ///
    /// Rounds half away from zero to the currency's minor unit and groups
    /// the integer part by thousands.
    #[must_use]
    pub fn display(&self) -> String {
        let places = self.currency_code.minor_units();
        let rounded = self
            .amount
            .round_dp_with_strategy(places, RoundingStrategy::MidpointAwayFromZero);
        let negative = rounded.is_sign_negative() && !rounded.is_zero();
        let text = format!("{:.*}", places as usize, rounded.abs());
        let (int_part, frac_part) = text.split_once('.').unwrap_or((text.as_str(), ""));

        let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
        for (i, ch) in int_part.chars().enumerate() {
            if i > 0 && (int_part.len() - i) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(ch);
        }

        let sign = if negative { "-" } else { "" };
        let symbol = self.currency_code.symbol();
        if frac_part.is_empty() {
            format!("{sign}{symbol}{grouped}")
        } else {
            format!("{sign}{symbol}{grouped}.{frac_part}")
        }
    }
}

impl std::fmt::Display for Price {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.display())
    }
}

/// ISO 4217 currency codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    JPY,
    USD,
    EUR,
    GBP,
}

impl CurrencyCode {
    /// Currency symbol used when formatting.
    #[must_use]
    pub const fn symbol(&self) -> &'static str {
        match self {
            Self::JPY => "¥",
            Self::USD => "$",
            Self::EUR => "€",
            Self::GBP => "£",
        }
    }

    /// Number of digits after the decimal separator.
    #[must_use]
    pub const fn minor_units(&self) -> u32 {
        match self {
            Self::JPY => 0,
            Self::USD | Self::EUR | Self::GBP => 2,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::str::FromStr;

    use super::*;

    fn price(amount: &str, code: CurrencyCode) -> Price {
        Price::new(Decimal::from_str(amount).unwrap(), code)
    }

    #[test]
    fn test_display_yen_groups_thousands() {
        assert_eq!(price("1200", CurrencyCode::JPY).display(), "¥1,200");
        assert_eq!(price("1234567", CurrencyCode::JPY).display(), "¥1,234,567");
        assert_eq!(price("999", CurrencyCode::JPY).display(), "¥999");
        assert_eq!(price("0", CurrencyCode::JPY).display(), "¥0");
    }

    #[test]
    fn test_display_yen_rounds_decimal_strings() {
        assert_eq!(price("1200.00", CurrencyCode::JPY).display(), "¥1,200");
        assert_eq!(price("1199.5", CurrencyCode::JPY).display(), "¥1,200");
    }

    #[test]
    fn test_display_dollars_keeps_cents() {
        assert_eq!(price("19.9", CurrencyCode::USD).display(), "$19.90");
        assert_eq!(price("12345.678", CurrencyCode::USD).display(), "$12,345.68");
    }

    #[test]
    fn test_display_negative() {
        assert_eq!(price("-500", CurrencyCode::JPY).display(), "-¥500");
    }

    #[test]
    fn test_amount_accepts_number_or_string() {
        let from_number: Decimal = serde_json::from_str("1200").unwrap();
        let from_string: Decimal = serde_json::from_str("\"1200.00\"").unwrap();
        assert_eq!(from_number, from_string);
    }
}
