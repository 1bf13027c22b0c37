//! Order statistics over historic prices

use super::decimal::{self, Decimal};
use super::error::{OracleError, OracleResult};
use serde::{Deserialize, Serialize};

/// A price, median or deviation recorded for `denom` at `block`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceStamp {
    pub denom: String,
    pub block: u64,
    pub exchange_rate: Decimal,
}

impl PriceStamp {
    pub fn new(denom: impl Into<String>, block: u64, exchange_rate: Decimal) -> Self {
        Self {
            denom: denom.into(),
            block,
            exchange_rate,
        }
    }
}

/// Sort by denom, then block.
pub fn sort_stamps(stamps: &mut [PriceStamp]) {
    stamps.sort_by(|a, b| a.denom.cmp(&b.denom).then(a.block.cmp(&b.block)));
}

fn non_empty(values: &[Decimal]) -> OracleResult<()> {
    if values.is_empty() {
        return Err(OracleError::EmptyList("empty price list passed in".into()));
    }
    Ok(())
}

/// Middle value; the mean of the two middle values for even lengths.
pub fn median(values: &[Decimal]) -> OracleResult<Decimal> {
    non_empty(values)?;
    let mut sorted = values.to_vec();
    sorted.sort();
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        let sum = decimal::checked_add(sorted[mid - 1], sorted[mid])?;
        decimal::checked_div(sum, Decimal::TWO)
    } else {
        Ok(sorted[mid])
    }
}

/// `sqrt(sum((v - median)^2 / n))`
pub fn median_deviation(median: Decimal, values: &[Decimal]) -> OracleResult<Decimal> {
    non_empty(values)?;
    let n = Decimal::from(values.len() as u64);
    let mut variance = Decimal::ZERO;
    for v in values {
        let diff = decimal::checked_sub(*v, median)?.abs();
        let term = decimal::checked_div(decimal::checked_mul(diff, diff)?, n)?;
        variance = decimal::checked_add(variance, term)?;
    }
    decimal::checked_sqrt(variance)
}

pub fn average(values: &[Decimal]) -> OracleResult<Decimal> {
    non_empty(values)?;
    let mut sum = Decimal::ZERO;
    for v in values {
        sum = decimal::checked_add(sum, *v)?;
    }
    decimal::checked_div(sum, Decimal::from(values.len() as u64))
}

pub fn max(values: &[Decimal]) -> OracleResult<Decimal> {
    non_empty(values)?;
    Ok(values.iter().copied().fold(values[0], Decimal::max))
}

pub fn min(values: &[Decimal]) -> OracleResult<Decimal> {
    non_empty(values)?;
    Ok(values.iter().copied().fold(values[0], Decimal::min))
}
