//! Rate resolution abstractions and core types

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

use super::error::{FetchError, ParseError, ResolveError};
use super::normalize::normalize;

/// Three letter uppercase currency identifier, e.g. `USD`.
///
/// Input is trimmed and uppercased. Codes are not checked against a registry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CurrencyCode(String);

impl CurrencyCode {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for CurrencyCode {
    type Err = ResolveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim().to_ascii_uppercase();
        if code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic()) {
            Ok(CurrencyCode(code))
        } else {
            Err(ResolveError::InvalidCurrency(s.to_string()))
        }
    }
}

impl TryFrom<String> for CurrencyCode {
    type Error = ResolveError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CurrencyCode> for String {
    fn from(code: CurrencyCode) -> String {
        code.0
    }
}

impl Display for CurrencyCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CurrencyPair {
    pub from: CurrencyCode,
    pub to: CurrencyCode,
}

impl CurrencyPair {
    pub fn new(from: CurrencyCode, to: CurrencyCode) -> Self {
        Self { from, to }
    }
}

impl Display for CurrencyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.from, self.to)
    }
}

/// Units of the target currency for one unit of the source currency. Always positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Rate(Decimal);

impl Rate {
    pub const ONE: Rate = Rate(Decimal::ONE);

    pub fn new(value: Decimal) -> Option<Self> {
        (value > Decimal::ZERO).then_some(Rate(value))
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for Rate {
    type Error = ParseError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Rate::new(value).ok_or(ParseError::NonPositive(value))
    }
}

impl From<Rate> for Decimal {
    fn from(rate: Rate) -> Decimal {
        rate.0
    }
}

impl Display for Rate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.normalize())
    }
}

/// Provider specific quote before normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawQuote {
    pub raw: String,
    pub unit_divisor: u32,
    pub source: String,
}

impl RawQuote {
    pub fn new(raw: impl Into<String>, unit_divisor: u32, source: impl Into<String>) -> Self {
        Self {
            raw: raw.into(),
            unit_divisor,
            source: source.into(),
        }
    }

    pub fn normalize(&self) -> Result<Rate, ParseError> {
        normalize(&self.raw, self.unit_divisor)
    }
}

/// Outcome of one provider attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderResult {
    Success(Rate),
    NotFound,
    Error(FetchError),
}

impl From<Result<Rate, FetchError>> for ProviderResult {
    fn from(result: Result<Rate, FetchError>) -> Self {
        match result {
            Ok(rate) => ProviderResult::Success(rate),
            Err(e) => ProviderResult::Error(e),
        }
    }
}

/// One upstream rate source.
///
/// Expected failures (network, missing data, malformed payloads) are reported
/// through [`ProviderResult`], never by panicking.
#[async_trait]
pub trait RateSourceProvider: Send + Sync {
    fn id(&self) -> &str;

    async fn fetch(&self, pair: &CurrencyPair) -> ProviderResult;
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_currency_code_is_trimmed_and_uppercased() {
        let code: CurrencyCode = " usd ".parse().unwrap();
        assert_eq!(code.as_str(), "USD");
    }

    #[test]
    fn test_currency_code_rejects_bad_input() {
        for input in ["", "US", "USDT", "U5D", "€UR"] {
            assert!(
                matches!(
                    input.parse::<CurrencyCode>(),
                    Err(ResolveError::InvalidCurrency(_))
                ),
                "{input} should be rejected"
            );
        }
    }

    #[test]
    fn test_rate_must_be_positive() {
        assert!(Rate::new(dec!(0)).is_none());
        assert!(Rate::new(dec!(-1.5)).is_none());
        assert_eq!(Rate::new(dec!(34.12)).unwrap().value(), dec!(34.12));
        assert_eq!(Rate::ONE.value(), Decimal::ONE);
    }

    #[test]
    fn test_raw_quote_applies_unit_divisor() {
        let quote = RawQuote::new("24.5100", 100, "central_bank");
        assert_eq!(quote.normalize().unwrap().value(), dec!(0.2451));
    }
}
