//! Published events (Outgoing)

use crate::domain::{AccAddress, Coin, Decimal, ValAddress};
use serde::{Deserialize, Serialize};

/// Everything the oracle announces on the event bus.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum OracleEvent {
    /// A consensus rate was written for `denom`.
    SetFxRate { denom: String, rate: Decimal },
    /// A validator delegated its feeding rights.
    DelegateFeedConsent {
        operator: ValAddress,
        delegate: AccAddress,
    },
    /// Params changed; the feeder should reload when `notify_price_feeder`.
    ParamUpdate { notify_price_feeder: bool },
    /// A validator fell under the valid-vote rate and was slashed and jailed.
    ValidatorSlashed {
        validator: ValAddress,
        fraction: Decimal,
        height: u64,
    },
    /// Rewards moved to the distribution module for ballot winners.
    RewardsDistributed { total: Vec<Coin> },
}

impl OracleEvent {
    /// Short, stable name for logs and metrics labels.
    pub fn kind(&self) -> &'static str {
        match self {
            OracleEvent::SetFxRate { .. } => "set_fx_rate",
            OracleEvent::DelegateFeedConsent { .. } => "delegate_feed_consent",
            OracleEvent::ParamUpdate { .. } => "param_update",
            OracleEvent::ValidatorSlashed { .. } => "validator_slashed",
            OracleEvent::RewardsDistributed { .. } => "rewards_distributed",
        }
    }
}
