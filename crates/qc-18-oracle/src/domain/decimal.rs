//! Fixed-precision decimal helpers
//!
//! All on-chain decimals carry at most 18 fractional digits. Every
//! multiplication or division that produces a stored value is quantized
//! back to that precision with banker's rounding.

use super::error::{OracleError, OracleResult};
use rust_decimal::prelude::*;
use rust_decimal::{MathematicalOps, RoundingStrategy};

pub use rust_decimal::Decimal;

/// Number of fractional digits kept for every stored decimal.
pub const PRECISION: u32 = 18;

/// Round to the on-chain precision.
pub fn quantize(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(PRECISION, RoundingStrategy::MidpointNearestEven)
}

/// Parse a decimal literal, rejecting anything with more than 18 fractional digits.
pub fn parse_decimal(raw: &str) -> OracleResult<Decimal> {
    let trimmed = raw.trim();
    let value = Decimal::from_str_exact(trimmed)
        .map_err(|e| OracleError::InvalidExchangeRate(format!("{trimmed}: {e}")))?;
    if value.scale() > PRECISION {
        return Err(OracleError::InvalidExchangeRate(format!(
            "{trimmed}: too much precision"
        )));
    }
    Ok(value)
}

pub fn checked_add(a: Decimal, b: Decimal) -> OracleResult<Decimal> {
    a.checked_add(b)
        .ok_or_else(|| OracleError::Arithmetic(format!("{a} + {b}")))
}

pub fn checked_sub(a: Decimal, b: Decimal) -> OracleResult<Decimal> {
    a.checked_sub(b)
        .ok_or_else(|| OracleError::Arithmetic(format!("{a} - {b}")))
}

pub fn checked_mul(a: Decimal, b: Decimal) -> OracleResult<Decimal> {
    a.checked_mul(b)
        .map(quantize)
        .ok_or_else(|| OracleError::Arithmetic(format!("{a} * {b}")))
}

pub fn checked_div(a: Decimal, b: Decimal) -> OracleResult<Decimal> {
    if b.is_zero() {
        return Err(OracleError::Arithmetic(format!("{a} / 0")));
    }
    a.checked_div(b)
        .map(quantize)
        .ok_or_else(|| OracleError::Arithmetic(format!("{a} / {b}")))
}

pub fn checked_sqrt(value: Decimal) -> OracleResult<Decimal> {
    value
        .sqrt()
        .map(quantize)
        .ok_or_else(|| OracleError::Arithmetic(format!("sqrt({value})")))
}

pub fn checked_ln(value: Decimal) -> OracleResult<Decimal> {
    value
        .checked_ln()
        .map(quantize)
        .ok_or_else(|| OracleError::Arithmetic(format!("ln({value})")))
}

/// Lift a token amount into decimal space.
pub fn from_amount(amount: u128) -> OracleResult<Decimal> {
    Decimal::from_u128(amount)
        .ok_or_else(|| OracleError::Arithmetic(format!("amount {amount} exceeds decimal range")))
}

/// Truncate toward zero and convert back to a token amount. Negative values are an error.
pub fn truncate_to_amount(value: Decimal) -> OracleResult<u128> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(OracleError::Arithmetic(format!("negative amount {value}")));
    }
    value
        .trunc()
        .to_u128()
        .ok_or_else(|| OracleError::Arithmetic(format!("{value} does not fit an amount")))
}

/// `10^exponent` as a decimal.
pub fn pow10(exponent: u32) -> OracleResult<Decimal> {
    let mut out = Decimal::ONE;
    for _ in 0..exponent {
        out = out
            .checked_mul(Decimal::TEN)
            .ok_or_else(|| OracleError::Arithmetic(format!("10^{exponent}")))?;
    }
    Ok(out)
}
