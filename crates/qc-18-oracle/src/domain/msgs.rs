//! State-changing messages accepted by the oracle
//!
//! `validate_basic` performs the stateless checks. Anything that needs the
//! store lives in [`crate::service::OracleMsgServer`].

use super::address::{AccAddress, ValAddress};
use super::decimal::Decimal;
use super::denom::{CurrencyDeviationThreshold, CurrencyPairProviders, Denom};
use super::error::{OracleError, OracleResult};
use super::params::{ParamKey, Params};
use super::plan::ParamUpdatePlan;
use super::vote::{parse_exchange_rates, VoteHash, VOTE_HASH_LEN};
use serde::{Deserialize, Serialize};

/// Longest accepted exchange-rate string.
pub const MAX_EXCHANGE_RATES_LEN: usize = 4096;
/// Salt length in hex characters.
pub const SALT_LEN: usize = 64;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgAggregateExchangeRatePrevote {
    pub hash: String,
    pub feeder: AccAddress,
    pub validator: ValAddress,
}

impl MsgAggregateExchangeRatePrevote {
    pub fn validate_basic(&self) -> OracleResult<()> {
        hex::decode(&self.hash)
            .map_err(|e| OracleError::InvalidHash(format!("invalid vote hash ({e})")))?;
        if self.hash.len() != VOTE_HASH_LEN * 2 {
            return Err(OracleError::InvalidHashLength {
                expected: VOTE_HASH_LEN,
            });
        }
        Ok(())
    }

    pub fn vote_hash(&self) -> OracleResult<VoteHash> {
        VoteHash::from_hex(&self.hash)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgAggregateExchangeRateVote {
    pub salt: String,
    pub exchange_rates: String,
    pub feeder: AccAddress,
    pub validator: ValAddress,
}

impl MsgAggregateExchangeRateVote {
    pub fn validate_basic(&self) -> OracleResult<()> {
        match self.exchange_rates.len() {
            0 => {
                return Err(OracleError::InvalidRequest(
                    "must provide at least one oracle exchange rate".into(),
                ))
            }
            l if l > MAX_EXCHANGE_RATES_LEN => {
                return Err(OracleError::InvalidRequest(
                    "exchange rates string can not exceed 4096 characters".into(),
                ))
            }
            _ => {}
        }
        parse_exchange_rates(&self.exchange_rates)?;

        if self.salt.len() != SALT_LEN {
            return Err(OracleError::InvalidSaltLength);
        }
        if hex::decode(&self.salt).is_err() {
            return Err(OracleError::InvalidSaltFormat);
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgDelegateFeedConsent {
    pub operator: ValAddress,
    pub delegate: AccAddress,
}

/// Title and description attached to every governance message.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    pub title: String,
    pub description: String,
}

impl Proposal {
    pub fn validate(&self) -> OracleResult<()> {
        if self.title.trim().is_empty() {
            return Err(OracleError::InvalidRequest("proposal title cannot be blank".into()));
        }
        if self.description.trim().is_empty() {
            return Err(OracleError::InvalidRequest(
                "proposal description cannot be blank".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgGovUpdateParams {
    pub authority: AccAddress,
    pub proposal: Proposal,
    pub plan: ParamUpdatePlan,
}

impl MsgGovUpdateParams {
    pub fn validate_basic(&self) -> OracleResult<()> {
        self.proposal.validate()?;
        self.plan.validate_basic()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgGovAddDenoms {
    pub authority: AccAddress,
    pub proposal: Proposal,
    pub height: u64,
    pub denom_list: Vec<Denom>,
    pub mandatory: bool,
    pub reward_band: Option<Decimal>,
    pub currency_pair_providers: Vec<CurrencyPairProviders>,
    pub currency_deviation_thresholds: Vec<CurrencyDeviationThreshold>,
}

impl MsgGovAddDenoms {
    pub fn validate_basic(&self) -> OracleResult<()> {
        self.proposal.validate()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgGovRemoveCurrencyPairProviders {
    pub authority: AccAddress,
    pub proposal: Proposal,
    pub height: u64,
    pub currency_pair_providers: Vec<CurrencyPairProviders>,
}

impl MsgGovRemoveCurrencyPairProviders {
    pub fn validate_basic(&self) -> OracleResult<()> {
        self.proposal.validate()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgGovRemoveCurrencyDeviationThresholds {
    pub authority: AccAddress,
    pub proposal: Proposal,
    pub height: u64,
    pub currencies: Vec<String>,
}

impl MsgGovRemoveCurrencyDeviationThresholds {
    pub fn validate_basic(&self) -> OracleResult<()> {
        self.proposal.validate()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgGovCancelUpdateParamPlan {
    pub authority: AccAddress,
    pub proposal: Proposal,
    pub height: u64,
}

impl MsgGovCancelUpdateParamPlan {
    pub fn validate_basic(&self) -> OracleResult<()> {
        self.proposal.validate()
    }
}

/// Immediate parameter update, bypassing the plan queue.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgLegacyGovUpdateParams {
    pub authority: AccAddress,
    pub proposal: Proposal,
    pub keys: Vec<String>,
    pub changes: Params,
}

impl MsgLegacyGovUpdateParams {
    pub fn validate_basic(&self) -> OracleResult<()> {
        self.proposal.validate()?;
        for key in &self.keys {
            let key: ParamKey = key.parse()?;
            self.changes.validate_key(key)?;
        }
        Ok(())
    }
}
