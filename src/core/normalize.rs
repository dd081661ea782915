//! Shared decimal parsing and unit scaling for provider quotes.
//!
//! Every upstream emits period-separated decimals, so parsing always uses `.`
//! as the decimal separator and never consults the process locale.

use rust_decimal::Decimal;
use std::str::FromStr;

use super::error::ParseError;
use super::rate::Rate;

/// Parses `raw` as a rate quoted per `unit_divisor` units of the source currency.
///
/// A divisor of 0 or 1 leaves the parsed value unchanged.
pub fn normalize(raw: &str, unit_divisor: u32) -> Result<Rate, ParseError> {
    let text = raw.trim();
    if text.is_empty() {
        return Err(ParseError::Empty);
    }

    let digits = text.strip_prefix(['+', '-']).unwrap_or(text);
    let well_formed = !digits.is_empty()
        && digits.chars().all(|c| c.is_ascii_digit() || c == '.')
        && digits.matches('.').count() <= 1
        && digits.chars().any(|c| c.is_ascii_digit());
    if !well_formed {
        return Err(ParseError::NotNumeric(text.to_string()));
    }

    let mut value =
        Decimal::from_str(digits).map_err(|_| ParseError::NotNumeric(text.to_string()))?;
    if text.starts_with('-') {
        value = -value;
    }

    if unit_divisor > 1 {
        value /= Decimal::from(unit_divisor);
    }

    Rate::new(value).ok_or(ParseError::NonPositive(value))
}
