//! Money type for representing monetary values.
//!
//! Amounts are integers in the currency's minor unit. Chilean pesos have no
//! minor unit, so for CLP the stored amount is whole pesos.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Supported currencies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Currency {
    #[default]
    CLP,
    USD,
    EUR,
    ARS,
    MXN,
    BRL,
}

impl Currency {
    /// Get the currency code (e.g., "CLP").
    pub fn code(&self) -> &'static str {
        match self {
            Currency::CLP => "CLP",
            Currency::USD => "USD",
            Currency::EUR => "EUR",
            Currency::ARS => "ARS",
            Currency::MXN => "MXN",
            Currency::BRL => "BRL",
        }
    }

    /// Get the currency symbol (e.g., "$").
    pub fn symbol(&self) -> &'static str {
        match self {
            Currency::CLP => "$",
            Currency::USD => "US$",
            Currency::EUR => "\u{20ac}",
            Currency::ARS => "AR$",
            Currency::MXN => "MX$",
            Currency::BRL => "R$",
        }
    }

    /// Get the number of decimal places for this currency.
    pub fn decimal_places(&self) -> u32 {
        match self {
            Currency::CLP => 0,
            _ => 2,
        }
    }

    /// Parse a currency code string.
    pub fn from_code(code: &str) -> Option<Self> {
        match code.to_uppercase().as_str() {
            "CLP" => Some(Currency::CLP),
            "USD" => Some(Currency::USD),
            "EUR" => Some(Currency::EUR),
            "ARS" => Some(Currency::ARS),
            "MXN" => Some(Currency::MXN),
            "BRL" => Some(Currency::BRL),
            _ => None,
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// A monetary value with currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct Money {
    /// Amount in the smallest currency unit (whole pesos for CLP).
    pub amount_minor: i64,
    /// The currency.
    pub currency: Currency,
}

impl Money {
    /// Create a new Money value from minor units.
    pub fn new(amount_minor: i64, currency: Currency) -> Self {
        Self {
            amount_minor,
            currency,
        }
    }

    /// Create a Chilean peso amount.
    pub fn clp(pesos: i64) -> Self {
        Self::new(pesos, Currency::CLP)
    }

    /// Create a Money value from a decimal amount, rounding to the minor unit.
    ///
    /// ```
    /// use storefront_commerce::money::{Money, Currency};
    /// assert_eq!(Money::from_decimal(29990.4, Currency::CLP).amount_minor, 29990);
    /// assert_eq!(Money::from_decimal(49.99, Currency::USD).amount_minor, 4999);
    /// ```
    pub fn from_decimal(amount: f64, currency: Currency) -> Self {
        let multiplier = 10_i64.pow(currency.decimal_places());
        let amount_minor = (amount * multiplier as f64).round() as i64;
        Self::new(amount_minor, currency)
    }

    /// Create a zero amount in the given currency.
    pub fn zero(currency: Currency) -> Self {
        Self::new(0, currency)
    }

    /// Check if this is zero.
    pub fn is_zero(&self) -> bool {
        self.amount_minor == 0
    }

    /// Check if this is positive.
    pub fn is_positive(&self) -> bool {
        self.amount_minor > 0
    }

    /// Check if this is negative.
    pub fn is_negative(&self) -> bool {
        self.amount_minor < 0
    }

    /// Convert to a decimal value.
    pub fn to_decimal(&self) -> f64 {
        let divisor = 10_i64.pow(self.currency.decimal_places());
        self.amount_minor as f64 / divisor as f64
    }

    /// Format as a display string (e.g., "$29.990" or "US$49.99").
    pub fn display(&self) -> String {
        format!("{}{}", self.currency.symbol(), self.display_amount())
    }

    /// Format as a display string without symbol.
    pub fn display_amount(&self) -> String {
        if self.currency == Currency::CLP {
            return format_clp(self.amount_minor as f64);
        }
        let places = self.currency.decimal_places() as usize;
        format!("{:.places$}", self.to_decimal())
    }

    /// Try to add another Money value, returning None on currency mismatch or overflow.
    pub fn try_add(&self, other: &Money) -> Option<Money> {
        if self.currency != other.currency {
            return None;
        }
        self.amount_minor
            .checked_add(other.amount_minor)
            .map(|amount| Money::new(amount, self.currency))
    }

    /// Try to subtract another Money value.
    pub fn try_subtract(&self, other: &Money) -> Option<Money> {
        if self.currency != other.currency {
            return None;
        }
        self.amount_minor
            .checked_sub(other.amount_minor)
            .map(|amount| Money::new(amount, self.currency))
    }

    /// Multiply by a scalar, returning None on overflow.
    pub fn try_multiply(&self, factor: i64) -> Option<Money> {
        self.amount_minor
            .checked_mul(factor)
            .map(|amount| Money::new(amount, self.currency))
    }

    /// Sum an iterator of Money values.
    ///
    /// Returns None if any value has a different currency or the sum overflows.
    pub fn try_sum<'a>(
        mut iter: impl Iterator<Item = &'a Money>,
        currency: Currency,
    ) -> Option<Money> {
        iter.try_fold(Money::zero(currency), |acc, m| acc.try_add(m))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display())
    }
}

/// Format a peso amount the way Chilean customers read it.
///
/// The amount is rounded to whole pesos and grouped in thousands with `.`.
///
/// ```
/// use storefront_commerce::money::format_clp;
/// assert_eq!(format_clp(29990.0), "29.990");
/// assert_eq!(format_clp(1234567.6), "1.234.568");
/// ```
pub fn format_clp(amount: f64) -> String {
    let rounded = amount.round() as i64;
    let digits = rounded.unsigned_abs().to_string();

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if rounded < 0 {
        grouped.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }
    grouped
}

/// Serde adapter that reads and writes a CLP amount as a plain number.
///
/// Catalog files and client payloads carry prices as JSON numbers; this keeps
/// them that way while the domain works with [`Money`]. Fractional input is
/// rounded to whole pesos.
pub mod clp {
    use super::{Currency, Money};
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(money: &Money, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(money.amount_minor)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Money, D::Error> {
        let value = f64::deserialize(deserializer)?;
        if !value.is_finite() {
            return Err(de::Error::custom("price must be a finite number"));
        }
        Ok(Money::from_decimal(value, Currency::CLP))
    }

    /// Same as the parent module for `Option<Money>` fields.
    pub mod option {
        use super::super::{Currency, Money};
        use serde::{de, Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(
            money: &Option<Money>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match money {
                Some(m) => serializer.serialize_some(&m.amount_minor),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<Money>, D::Error> {
            match Option::<f64>::deserialize(deserializer)? {
                Some(value) if !value.is_finite() => {
                    Err(de::Error::custom("price must be a finite number"))
                }
                Some(value) => Ok(Some(Money::from_decimal(value, Currency::CLP))),
                None => Ok(None),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_from_minor() {
        let m = Money::new(29990, Currency::CLP);
        assert_eq!(m.amount_minor, 29990);
        assert_eq!(m.currency, Currency::CLP);
        assert_eq!(Money::clp(29990), m);
    }

    #[test]
    fn test_money_from_decimal() {
        let m = Money::from_decimal(49.99, Currency::USD);
        assert_eq!(m.amount_minor, 4999);

        let m = Money::from_decimal(100.5, Currency::CLP);
        assert_eq!(m.amount_minor, 101); // CLP has no decimals
    }

    #[test]
    fn test_money_display() {
        assert_eq!(Money::clp(29990).display(), "$29.990");
        assert_eq!(Money::new(4999, Currency::USD).display(), "US$49.99");
    }

    #[test]
    fn test_money_addition() {
        let a = Money::clp(1000);
        let b = Money::clp(500);
        assert_eq!(a.try_add(&b), Some(Money::clp(1500)));
    }

    #[test]
    fn test_money_subtraction() {
        let a = Money::clp(1000);
        let b = Money::clp(300);
        assert_eq!(a.try_subtract(&b), Some(Money::clp(700)));
    }

    #[test]
    fn test_money_multiply_overflow() {
        assert_eq!(Money::clp(1000).try_multiply(3), Some(Money::clp(3000)));
        assert_eq!(Money::clp(i64::MAX).try_multiply(2), None);
    }

    #[test]
    fn test_money_currency_mismatch() {
        let clp = Money::clp(1000);
        let usd = Money::new(1000, Currency::USD);
        assert_eq!(clp.try_add(&usd), None);
        assert_eq!(
            Money::try_sum([clp, usd].iter(), Currency::CLP),
            None
        );
    }

    #[test]
    fn test_money_sum() {
        let values = [Money::clp(100), Money::clp(250), Money::clp(650)];
        assert_eq!(
            Money::try_sum(values.iter(), Currency::CLP),
            Some(Money::clp(1000))
        );
        assert_eq!(
            Money::try_sum(std::iter::empty(), Currency::CLP),
            Some(Money::zero(Currency::CLP))
        );
    }

    #[test]
    fn test_currency_from_code() {
        assert_eq!(Currency::from_code("CLP"), Some(Currency::CLP));
        assert_eq!(Currency::from_code("usd"), Some(Currency::USD));
        assert_eq!(Currency::from_code("INVALID"), None);
    }

    #[test]
    fn test_format_clp() {
        assert_eq!(format_clp(0.0), "0");
        assert_eq!(format_clp(990.0), "990");
        assert_eq!(format_clp(1000.0), "1.000");
        assert_eq!(format_clp(29990.0), "29.990");
        assert_eq!(format_clp(39990.49), "39.990");
        assert_eq!(format_clp(-1500.0), "-1.500");
        assert_eq!(format_clp(1_000_000.0), "1.000.000");
    }

    #[test]
    fn test_clp_serde_adapter() {
        #[derive(Serialize, Deserialize)]
        struct Priced {
            #[serde(with = "clp")]
            price: Money,
            #[serde(with = "clp::option", default)]
            compare_at: Option<Money>,
        }

        let parsed: Priced = serde_json::from_str(r#"{"price": 29990.4}"#).unwrap();
        assert_eq!(parsed.price, Money::clp(29990));
        assert_eq!(parsed.compare_at, None);

        let json = serde_json::to_value(&parsed).unwrap();
        assert_eq!(json["price"], 29990);
        assert!(json["compare_at"].is_null());
    }
}
