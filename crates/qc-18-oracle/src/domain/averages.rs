//! Moving-average math over historic price samples
//!
//! Samples are always ordered oldest first.

use super::decimal::{self, Decimal};
use super::error::{OracleError, OracleResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Weighting scheme for the weighted moving average.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WmaStrategy {
    /// Weights `N..1`: the oldest sample counts most.
    Oldest,
    /// Weights `1..N`: the newest sample counts most.
    Recent,
    /// Ramp up, plateau, ramp down.
    Balanced,
    /// Caller-supplied weights, exactly one per sample.
    Custom,
}

impl WmaStrategy {
    /// Strategies precomputed and stored at every averaging boundary.
    pub const STORED: [WmaStrategy; 3] =
        [WmaStrategy::Oldest, WmaStrategy::Recent, WmaStrategy::Balanced];

    pub fn as_str(&self) -> &'static str {
        match self {
            WmaStrategy::Oldest => "OLDEST",
            WmaStrategy::Recent => "RECENT",
            WmaStrategy::Balanced => "BALANCED",
            WmaStrategy::Custom => "CUSTOM",
        }
    }
}

impl fmt::Display for WmaStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WmaStrategy {
    type Err = OracleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "OLDEST" => Ok(WmaStrategy::Oldest),
            "RECENT" => Ok(WmaStrategy::Recent),
            "BALANCED" => Ok(WmaStrategy::Balanced),
            "CUSTOM" => Ok(WmaStrategy::Custom),
            _ => Err(OracleError::InvalidWmaStrategy(s.to_string())),
        }
    }
}

/// Which moving average a conversion should price against.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MaType {
    Sma,
    Ema,
    Wma,
}

impl FromStr for MaType {
    type Err = OracleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sma" => Ok(MaType::Sma),
            "ema" => Ok(MaType::Ema),
            "wma" => Ok(MaType::Wma),
            _ => Err(OracleError::InvalidRequest(format!("invalid MA type: {s}"))),
        }
    }
}

/// Weights for `n` samples under `strategy`.
pub fn wma_weights(
    strategy: WmaStrategy,
    n: usize,
    custom: &[Decimal],
) -> OracleResult<Vec<Decimal>> {
    let weights = match strategy {
        WmaStrategy::Oldest => (0..n).map(|i| Decimal::from((n - i) as u64)).collect(),
        WmaStrategy::Recent => (1..=n).map(|i| Decimal::from(i as u64)).collect(),
        WmaStrategy::Balanced => {
            let ramp = n / 3;
            (0..n)
                .map(|i| {
                    let w = if i < ramp {
                        i + 1
                    } else if i >= n - ramp {
                        n - i
                    } else {
                        ramp + 1
                    };
                    Decimal::from(w as u64)
                })
                .collect()
        }
        WmaStrategy::Custom => {
            if custom.len() != n {
                return Err(OracleError::InvalidCustomWeights {
                    expected: n,
                    actual: custom.len(),
                });
            }
            if custom.iter().any(|w| w.is_sign_negative() && !w.is_zero()) {
                return Err(OracleError::InvalidRequest(
                    "custom_weights must not be negative".into(),
                ));
            }
            custom.to_vec()
        }
    };
    Ok(weights)
}

/// Arithmetic mean. Empty input yields `None`.
pub fn simple_moving_average(samples: &[Decimal]) -> OracleResult<Option<Decimal>> {
    if samples.is_empty() {
        return Ok(None);
    }
    let mut sum = Decimal::ZERO;
    for s in samples {
        sum = decimal::checked_add(sum, *s)?;
    }
    decimal::checked_div(sum, Decimal::from(samples.len() as u64)).map(Some)
}

/// Weighted mean with explicit weights, one per sample.
pub fn weighted_moving_average(samples: &[Decimal], weights: &[Decimal]) -> OracleResult<Decimal> {
    if samples.len() != weights.len() {
        return Err(OracleError::InvalidCustomWeights {
            expected: samples.len(),
            actual: weights.len(),
        });
    }
    let mut weighted = Decimal::ZERO;
    let mut total = Decimal::ZERO;
    for (s, w) in samples.iter().zip(weights) {
        weighted = decimal::checked_add(weighted, decimal::checked_mul(*s, *w)?)?;
        total = decimal::checked_add(total, *w)?;
    }
    if total.is_zero() {
        return Err(OracleError::InvalidRequest(
            "sum of WMA weights must be greater than zero".into(),
        ));
    }
    decimal::checked_div(weighted, total)
}

/// Exponential moving average with `alpha = 2 / (window + 1)`.
///
/// With a previous EMA every sample is folded into it; otherwise the oldest
/// sample seeds the average and the rest are folded.
pub fn exponential_moving_average(
    previous: Option<Decimal>,
    samples: &[Decimal],
    window: u64,
) -> OracleResult<Option<Decimal>> {
    let alpha = decimal::checked_div(Decimal::TWO, Decimal::from(window + 1))?;
    let keep = decimal::checked_sub(Decimal::ONE, alpha)?;

    let (mut ema, rest) = match (previous, samples.split_first()) {
        (Some(prev), _) => (prev, samples),
        (None, Some((first, rest))) => (*first, rest),
        (None, None) => return Ok(None),
    };
    for p in rest {
        ema = decimal::checked_add(
            decimal::checked_mul(*p, alpha)?,
            decimal::checked_mul(ema, keep)?,
        )?;
    }
    Ok(Some(ema))
}
