//! # Oracle Metrics
//!
//! Prometheus metrics for monitoring the price oracle.
//!
//! ## Usage
//!
//! Enable with the `metrics` feature:
//! ```toml
//! qc-18-oracle = { path = "...", features = ["metrics"] }
//! ```
//!
//! ## Metrics Exported
//!
//! - `oracle_exchange_rate` - Gauge of the latest consensus rate per denom
//! - `oracle_ballots_dropped_total` - Counter of dropped ballots (by denom and reason)
//! - `oracle_validators_slashed_total` - Counter of validators slashed for missed votes
//! - `oracle_rewards_distributed_total` - Counter of reward amounts paid out (by denom)
//! - `oracle_proposals_rejected_total` - Counter of rejected proposals (by reason)

use crate::domain::{Coin, Decimal};

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
use prometheus::{
    register_counter_vec, register_gauge_vec, register_int_counter, CounterVec, GaugeVec,
    IntCounter,
};

#[cfg(feature = "metrics")]
use rust_decimal::prelude::ToPrimitive;

#[cfg(feature = "metrics")]
lazy_static! {
    /// Latest consensus exchange rate per denom
    pub static ref EXCHANGE_RATE: GaugeVec = register_gauge_vec!(
        "oracle_exchange_rate",
        "Latest consensus exchange rate",
        &["denom"]
    )
    .expect("Failed to create EXCHANGE_RATE metric");

    /// Ballots dropped during the tally
    pub static ref BALLOTS_DROPPED: CounterVec = register_counter_vec!(
        "oracle_ballots_dropped_total",
        "Total number of ballots dropped during the tally",
        &["denom", "reason"]
    )
    .expect("Failed to create BALLOTS_DROPPED metric");

    /// Validators slashed and jailed for missing votes
    pub static ref VALIDATORS_SLASHED: IntCounter = register_int_counter!(
        "oracle_validators_slashed_total",
        "Total number of validators slashed for missing oracle votes"
    )
    .expect("Failed to create VALIDATORS_SLASHED metric");

    /// Reward amounts moved to the distribution module
    pub static ref REWARDS_DISTRIBUTED: CounterVec = register_counter_vec!(
        "oracle_rewards_distributed_total",
        "Total reward amount distributed to ballot winners",
        &["denom"]
    )
    .expect("Failed to create REWARDS_DISTRIBUTED metric");

    /// Proposals rejected in ProcessProposal
    pub static ref PROPOSALS_REJECTED: CounterVec = register_counter_vec!(
        "oracle_proposals_rejected_total",
        "Total number of proposals rejected by the oracle",
        &["reason"]
    )
    .expect("Failed to create PROPOSALS_REJECTED metric");
}

/// Record the consensus rate written for `denom`
#[cfg(feature = "metrics")]
pub fn record_exchange_rate(denom: &str, rate: Decimal) {
    if let Some(value) = rate.to_f64() {
        EXCHANGE_RATE.with_label_values(&[denom]).set(value);
    }
}

/// Record a ballot dropped from the tally
#[cfg(feature = "metrics")]
pub fn record_ballot_dropped(denom: &str, reason: &str) {
    BALLOTS_DROPPED.with_label_values(&[denom, reason]).inc();
}

/// Record a slashed validator
#[cfg(feature = "metrics")]
pub fn record_validator_slashed() {
    VALIDATORS_SLASHED.inc();
}

/// Record rewards paid out in one vote period
#[cfg(feature = "metrics")]
pub fn record_rewards_distributed(coins: &[Coin]) {
    for coin in coins {
        REWARDS_DISTRIBUTED
            .with_label_values(&[coin.denom.as_str()])
            .inc_by(coin.amount as f64);
    }
}

/// Record a rejected proposal with reason
#[cfg(feature = "metrics")]
pub fn record_proposal_rejected(reason: &str) {
    PROPOSALS_REJECTED.with_label_values(&[reason]).inc();
}

// No-op implementations when metrics feature is disabled
#[cfg(not(feature = "metrics"))]
pub fn record_exchange_rate(_denom: &str, _rate: Decimal) {}

#[cfg(not(feature = "metrics"))]
pub fn record_ballot_dropped(_denom: &str, _reason: &str) {}

#[cfg(not(feature = "metrics"))]
pub fn record_validator_slashed() {}

#[cfg(not(feature = "metrics"))]
pub fn record_rewards_distributed(_coins: &[Coin]) {}

#[cfg(not(feature = "metrics"))]
pub fn record_proposal_rejected(_reason: &str) {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_noop_when_disabled() {
        record_exchange_rate("CHEQ", Decimal::ONE);
        record_ballot_dropped("CHEQ", "below_threshold");
        record_validator_slashed();
        record_rewards_distributed(&[Coin::new("ncheq", 10)]);
        record_proposal_rejected("test");
    }
}
