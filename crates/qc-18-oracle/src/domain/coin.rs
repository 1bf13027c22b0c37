//! Integer token amounts

use super::error::{OracleError, OracleResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Amount of a single denom, e.g. `2000000000ncheq`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coin {
    pub denom: String,
    pub amount: u128,
}

impl Coin {
    pub fn new(denom: impl Into<String>, amount: u128) -> Self {
        Self {
            denom: denom.into(),
            amount,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.amount == 0
    }
}

impl fmt::Display for Coin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount, self.denom)
    }
}

impl FromStr for Coin {
    type Err = OracleError;

    /// Parses `<digits><denom>`; the denom is lowercased.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let split = s
            .find(|c: char| !c.is_ascii_digit())
            .ok_or_else(|| OracleError::InvalidRequest(format!("invalid amount format: {s}")))?;
        let (digits, denom) = s.split_at(split);
        if digits.is_empty() || denom.is_empty() {
            return Err(OracleError::InvalidRequest(format!(
                "invalid amount format: {s}"
            )));
        }
        let amount = digits
            .parse::<u128>()
            .map_err(|e| OracleError::InvalidRequest(format!("invalid amount format: {e}")))?;
        Ok(Coin::new(denom.to_lowercase(), amount))
    }
}

/// Coins held by one account, at most one entry per denom.
pub type Coins = Vec<Coin>;

/// Sum of all amounts for `denom`.
pub fn amount_of(coins: &[Coin], denom: &str) -> u128 {
    coins
        .iter()
        .filter(|c| c.denom == denom)
        .map(|c| c.amount)
        .sum()
}

/// Merge amounts by denom, dropping zero entries and sorting by denom.
pub fn normalize_coins(coins: Coins) -> OracleResult<Coins> {
    let mut merged: std::collections::BTreeMap<String, u128> = Default::default();
    for coin in coins {
        let entry = merged.entry(coin.denom).or_default();
        *entry = entry
            .checked_add(coin.amount)
            .ok_or_else(|| OracleError::Arithmetic("coin amount overflow".into()))?;
    }
    Ok(merged
        .into_iter()
        .filter(|(_, amount)| *amount > 0)
        .map(|(denom, amount)| Coin::new(denom, amount))
        .collect())
}
