use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;

use super::error::FatooraError;

/// Parse the text content of an amount field.
///
/// Parsing is locale-agnostic: `.` is the only decimal separator and `,` is
/// accepted as a digit-group separator (`"1,234.50"`). Scientific notation
/// (`"1.5E2"`) is accepted as well. `path` is only used for the error.
pub fn parse_amount(text: &str, path: &str) -> Result<Decimal, FatooraError> {
    let invalid = || FatooraError::InvalidAmount {
        path: path.to_string(),
        value: text.to_string(),
    };

    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(invalid());
    }

    let cleaned: String = trimmed.chars().filter(|c| *c != ',').collect();
    let (negative, digits) = match cleaned.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, cleaned.strip_prefix('+').unwrap_or(&cleaned)),
    };
    if !digits.starts_with(|c: char| c.is_ascii_digit() || c == '.') {
        return Err(invalid());
    }

    let value = if digits.contains(['e', 'E']) {
        Decimal::from_scientific(digits)
    } else {
        Decimal::from_str(digits)
    }
    .map_err(|_| invalid())?;

    Ok(if negative { -value } else { value })
}

/// Round a Decimal to `dp` decimal places using half-up (commercial rounding).
pub fn round_half_up(value: Decimal, dp: u32) -> Decimal {
    value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero)
}

/// `a + b`, or [`FatooraError::Arithmetic`] naming `what` on overflow.
pub fn checked_add(a: Decimal, b: Decimal, what: &str) -> Result<Decimal, FatooraError> {
    a.checked_add(b)
        .ok_or_else(|| FatooraError::Arithmetic(format!("overflow computing {what}")))
}

/// `a - b`, or [`FatooraError::Arithmetic`] naming `what` on overflow.
pub fn checked_sub(a: Decimal, b: Decimal, what: &str) -> Result<Decimal, FatooraError> {
    a.checked_sub(b)
        .ok_or_else(|| FatooraError::Arithmetic(format!("overflow computing {what}")))
}

/// `a * b`, or [`FatooraError::Arithmetic`] naming `what` on overflow.
pub fn checked_mul(a: Decimal, b: Decimal, what: &str) -> Result<Decimal, FatooraError> {
    a.checked_mul(b)
        .ok_or_else(|| FatooraError::Arithmetic(format!("overflow computing {what}")))
}

/// `a / b`, or [`FatooraError::Arithmetic`] naming `what` on overflow or
/// division by zero.
pub fn checked_div(a: Decimal, b: Decimal, what: &str) -> Result<Decimal, FatooraError> {
    a.checked_div(b)
        .ok_or_else(|| FatooraError::Arithmetic(format!("overflow computing {what}")))
}

/// Compare a computed value with a stated one.
///
/// With `precision = Some(dp)` the values match when their difference
/// rounds to zero at `dp` decimal places, so `Some(2)` accepts anything
/// below half a halala. `None` requires exact equality.
pub fn amounts_match(expected: Decimal, actual: Decimal, precision: Option<u32>) -> bool {
    match precision {
        None => expected == actual,
        Some(dp) => expected
            .checked_sub(actual)
            .is_some_and(|diff| round_half_up(diff, dp).is_zero()),
    }
}
