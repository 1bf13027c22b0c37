//! Oracle keeper: typed access to the oracle store
//!
//! The keeper owns the key-value store and borrows the staking, bank and
//! event-bus collaborators. Every engine of the oracle is a set of keeper
//! methods split across the submodules:
//!
//! - `ballot`: ballot aggregation and clearing
//! - `slash`: miss counters, slashing, reward set
//! - `reward`: reward distribution to ballot winners
//! - `historic`: historic prices, medians, deviations, pruning
//! - `averages`: stored SMA / EMA / WMA
//! - `convert`: USD to native conversion
//! - `plan`: scheduled parameter updates
//!
//! All methods are deterministic for a given store and validator set.

mod averages;
mod ballot;
mod convert;
mod historic;
mod plan;
mod reward;
mod slash;

pub use convert::convert_usd_to_ncheq;
pub use reward::reward_factor;

use crate::domain::{
    address_from_key, aggregate_prevote_key, aggregate_vote_key, denom_from_key,
    exchange_rate_key, feeder_delegation_key, miss_counter_key, params_key, rate_per_base_unit,
    AccAddress, AggregateExchangeRatePrevote, AggregateExchangeRateVote, Decimal, KVStoreError,
    OracleError, OracleResult, Params, ValAddress, PREFIX_AGGREGATE_PREVOTE,
    PREFIX_AGGREGATE_VOTE, PREFIX_EXCHANGE_RATE, PREFIX_FEEDER_DELEGATION, PREFIX_MISS_COUNTER,
};
use crate::events::OracleEvent;
use crate::ports::{BankKeeper, EventBus, KeyValueStore, StakingKeeper, ValidatorInfo};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

/// Dependencies for OracleKeeper
pub struct KeeperDependencies<S> {
    pub store: S,
    pub staking: Arc<dyn StakingKeeper>,
    pub bank: Arc<dyn BankKeeper>,
    pub event_bus: Arc<dyn EventBus>,
    /// Account allowed to run governance messages.
    pub authority: AccAddress,
}

pub struct OracleKeeper<S: KeyValueStore> {
    store: S,
    staking: Arc<dyn StakingKeeper>,
    bank: Arc<dyn BankKeeper>,
    event_bus: Arc<dyn EventBus>,
    authority: AccAddress,
}

/// True on the last block of every `period`-block window.
pub fn is_period_last_block(height: u64, period: u64) -> bool {
    period != 0 && (height + 1) % period == 0
}

pub(crate) fn encode<T: Serialize>(value: &T) -> OracleResult<Vec<u8>> {
    bincode::serialize(value).map_err(|e| OracleError::Codec(e.to_string()))
}

pub(crate) fn decode<T: DeserializeOwned>(key: &[u8], bytes: &[u8]) -> OracleResult<T> {
    bincode::deserialize(bytes).map_err(|e| {
        KVStoreError::Corrupted {
            key: hex::encode(key),
            message: e.to_string(),
        }
        .into()
    })
}

impl<S: KeyValueStore> OracleKeeper<S> {
    pub fn new(deps: KeeperDependencies<S>) -> Self {
        Self {
            store: deps.store,
            staking: deps.staking,
            bank: deps.bank,
            event_bus: deps.event_bus,
            authority: deps.authority,
        }
    }

    pub fn authority(&self) -> &AccAddress {
        &self.authority
    }

    pub fn staking(&self) -> &dyn StakingKeeper {
        self.staking.as_ref()
    }

    pub fn bank(&self) -> &dyn BankKeeper {
        self.bank.as_ref()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub(crate) fn emit(&self, event: OracleEvent) {
        let kind = event.kind();
        if let Err(e) = self.event_bus.publish(event) {
            tracing::warn!(subsystem = "oracle", kind, error = %e, "event bus rejected event");
        }
    }

    // === RAW VALUE ACCESS ===

    pub(crate) fn get_value<T: DeserializeOwned>(&self, key: &[u8]) -> OracleResult<Option<T>> {
        match self.store.get(key)? {
            Some(bytes) => decode(key, &bytes).map(Some),
            None => Ok(None),
        }
    }

    pub(crate) fn put_value<T: Serialize>(&mut self, key: &[u8], value: &T) -> OracleResult<()> {
        let bytes = encode(value)?;
        self.store.put(key, &bytes)?;
        Ok(())
    }

    pub(crate) fn delete_key(&mut self, key: &[u8]) -> OracleResult<()> {
        self.store.delete(key)?;
        Ok(())
    }

    pub(crate) fn scan_values<T: DeserializeOwned>(
        &self,
        prefix: &[u8],
    ) -> OracleResult<Vec<(Vec<u8>, T)>> {
        self.store
            .prefix_scan(prefix)?
            .into_iter()
            .map(|(k, v)| {
                let value = decode(&k, &v)?;
                Ok((k, value))
            })
            .collect()
    }

    // === PARAMS ===

    /// Stored params, or the defaults before genesis wrote any.
    pub fn params(&self) -> OracleResult<Params> {
        Ok(self.get_value(&params_key())?.unwrap_or_default())
    }

    pub fn set_params(&mut self, params: &Params) -> OracleResult<()> {
        params.validate()?;
        self.put_value(&params_key(), params)
    }

    // === EXCHANGE RATES ===

    /// Consensus rate for `symbol`, matched case-insensitively.
    pub fn exchange_rate(&self, symbol: &str) -> OracleResult<Decimal> {
        let symbol = symbol.to_uppercase();
        self.get_value(&exchange_rate_key(&symbol))?
            .ok_or(OracleError::UnknownDenom(symbol))
    }

    /// Consensus rate per base unit of the accept-list asset with `base_denom`.
    pub fn exchange_rate_base(&self, base_denom: &str) -> OracleResult<Decimal> {
        let params = self.params()?;
        let denom = params
            .accept_list
            .find_by_base(base_denom)
            .ok_or_else(|| OracleError::UnknownDenom(base_denom.to_string()))?;
        let rate = self.exchange_rate(&denom.symbol_denom)?;
        rate_per_base_unit(rate, denom.exponent)
    }

    pub fn set_exchange_rate(&mut self, denom: &str, rate: Decimal) -> OracleResult<()> {
        let denom = denom.to_uppercase();
        self.put_value(&exchange_rate_key(&denom), &rate)?;
        crate::metrics::record_exchange_rate(&denom, rate);
        Ok(())
    }

    pub fn set_exchange_rate_with_event(&mut self, denom: &str, rate: Decimal) -> OracleResult<()> {
        self.set_exchange_rate(denom, rate)?;
        self.emit(OracleEvent::SetFxRate {
            denom: denom.to_string(),
            rate,
        });
        Ok(())
    }

    /// All current consensus rates, ordered by symbol.
    pub fn exchange_rates(&self) -> OracleResult<Vec<(String, Decimal)>> {
        self.scan_values::<Decimal>(&[PREFIX_EXCHANGE_RATE])?
            .into_iter()
            .map(|(k, rate)| Ok((denom_from_key(&k)?, rate)))
            .collect()
    }

    pub fn clear_exchange_rates(&mut self) -> OracleResult<()> {
        for (key, _) in self.store.prefix_scan(&[PREFIX_EXCHANGE_RATE])? {
            self.store.delete(&key)?;
        }
        Ok(())
    }

    // === FEEDER DELEGATION ===

    fn bonded_validator(&self, operator: &ValAddress) -> OracleResult<ValidatorInfo> {
        match self
            .staking
            .validator(operator)
            .map_err(OracleError::Staking)?
        {
            Some(v) if v.bonded => Ok(v),
            _ => Err(OracleError::ValidatorNotFound(format!(
                "validator {operator} is not in active set"
            ))),
        }
    }

    /// Account allowed to vote for `operator`; the operator's own account by default.
    pub fn feeder_delegation(&self, operator: &ValAddress) -> OracleResult<AccAddress> {
        self.bonded_validator(operator)?;
        Ok(self
            .get_value(&feeder_delegation_key(operator))?
            .unwrap_or_else(|| AccAddress::from(*operator)))
    }

    pub fn set_feeder_delegation(
        &mut self,
        operator: &ValAddress,
        delegate: &AccAddress,
    ) -> OracleResult<()> {
        self.put_value(&feeder_delegation_key(operator), delegate)
    }

    pub fn feeder_delegations(&self) -> OracleResult<Vec<(ValAddress, AccAddress)>> {
        self.scan_values::<AccAddress>(&[PREFIX_FEEDER_DELEGATION])?
            .into_iter()
            .map(|(k, delegate)| Ok((address_from_key(&k)?, delegate)))
            .collect()
    }

    /// Ensure `feeder` may vote on behalf of `operator`.
    pub fn validate_feeder(&self, feeder: &AccAddress, operator: &ValAddress) -> OracleResult<()> {
        let delegate = self.feeder_delegation(operator)?;
        if &delegate != feeder {
            return Err(OracleError::NoVotingPermission {
                feeder: feeder.to_string(),
            });
        }
        Ok(())
    }

    // === MISS COUNTERS ===

    pub fn miss_counter(&self, operator: &ValAddress) -> OracleResult<u64> {
        Ok(self.get_value(&miss_counter_key(operator))?.unwrap_or(0))
    }

    pub fn set_miss_counter(&mut self, operator: &ValAddress, count: u64) -> OracleResult<()> {
        self.put_value(&miss_counter_key(operator), &count)
    }

    pub fn delete_miss_counter(&mut self, operator: &ValAddress) -> OracleResult<()> {
        self.delete_key(&miss_counter_key(operator))
    }

    pub fn miss_counters(&self) -> OracleResult<Vec<(ValAddress, u64)>> {
        self.scan_values::<u64>(&[PREFIX_MISS_COUNTER])?
            .into_iter()
            .map(|(k, count)| Ok((address_from_key(&k)?, count)))
            .collect()
    }

    // === AGGREGATE PREVOTES ===

    pub fn aggregate_prevote(&self, voter: &ValAddress) -> OracleResult<AggregateExchangeRatePrevote> {
        self.get_value(&aggregate_prevote_key(voter))?
            .ok_or_else(|| OracleError::NoAggregatePrevote {
                voter: voter.to_string(),
            })
    }

    pub fn has_aggregate_prevote(&self, voter: &ValAddress) -> OracleResult<bool> {
        Ok(self.store.exists(&aggregate_prevote_key(voter))?)
    }

    pub fn set_aggregate_prevote(
        &mut self,
        voter: &ValAddress,
        prevote: &AggregateExchangeRatePrevote,
    ) -> OracleResult<()> {
        self.put_value(&aggregate_prevote_key(voter), prevote)
    }

    pub fn delete_aggregate_prevote(&mut self, voter: &ValAddress) -> OracleResult<()> {
        self.delete_key(&aggregate_prevote_key(voter))
    }

    pub fn aggregate_prevotes(&self) -> OracleResult<Vec<AggregateExchangeRatePrevote>> {
        Ok(self
            .scan_values(&[PREFIX_AGGREGATE_PREVOTE])?
            .into_iter()
            .map(|(_, p)| p)
            .collect())
    }

    // === AGGREGATE VOTES ===

    pub fn aggregate_vote(&self, voter: &ValAddress) -> OracleResult<AggregateExchangeRateVote> {
        self.get_value(&aggregate_vote_key(voter))?
            .ok_or_else(|| OracleError::NoAggregateVote {
                voter: voter.to_string(),
            })
    }

    pub fn set_aggregate_vote(
        &mut self,
        voter: &ValAddress,
        vote: &AggregateExchangeRateVote,
    ) -> OracleResult<()> {
        debug!(
            subsystem = "oracle",
            validator = %voter,
            rates = vote.exchange_rates.len(),
            "storing aggregate vote"
        );
        self.put_value(&aggregate_vote_key(voter), vote)
    }

    pub fn delete_aggregate_vote(&mut self, voter: &ValAddress) -> OracleResult<()> {
        self.delete_key(&aggregate_vote_key(voter))
    }

    /// Stored votes in voter byte order.
    pub fn aggregate_votes(&self) -> OracleResult<Vec<AggregateExchangeRateVote>> {
        Ok(self
            .scan_values(&[PREFIX_AGGREGATE_VOTE])?
            .into_iter()
            .map(|(_, v)| v)
            .collect())
    }
}

#[cfg(test)]
pub(crate) mod test_utils {
    use super::*;
    use crate::adapters::{
        InMemoryBankKeeper, InMemoryEventBus, InMemoryKVStore, InMemoryStakingKeeper,
    };
    use crate::domain::ConsAddress;

    pub const POWER_REDUCTION: u128 = 1_000_000;

    pub struct Fixture {
        pub keeper: OracleKeeper<InMemoryKVStore>,
        pub staking: Arc<InMemoryStakingKeeper>,
        pub bank: Arc<InMemoryBankKeeper>,
        pub events: Arc<InMemoryEventBus>,
    }

    pub fn val(n: u8) -> ValAddress {
        ValAddress::new([n; 20])
    }

    pub fn validator_info(n: u8, power: u64) -> ValidatorInfo {
        ValidatorInfo {
            operator: val(n),
            cons_address: ConsAddress::new([n.wrapping_add(100); 20]),
            consensus_pubkey: vec![],
            tokens: power as u128 * POWER_REDUCTION,
            bonded: true,
            jailed: false,
        }
    }

    pub fn authority() -> AccAddress {
        AccAddress::new([0xAA; 20])
    }

    /// Keeper with default params and validators `1..=powers.len()`.
    pub fn fixture(powers: &[u64]) -> Fixture {
        let staking = Arc::new(InMemoryStakingKeeper::with_power_reduction(POWER_REDUCTION));
        for (i, p) in powers.iter().enumerate() {
            staking.upsert(validator_info(i as u8 + 1, *p));
        }
        let bank = Arc::new(InMemoryBankKeeper::new());
        let events = Arc::new(InMemoryEventBus::new());
        let mut keeper = OracleKeeper::new(KeeperDependencies {
            store: InMemoryKVStore::new(),
            staking: staking.clone(),
            bank: bank.clone(),
            event_bus: events.clone(),
            authority: authority(),
        });
        keeper.set_params(&Params::default()).unwrap();
        Fixture {
            keeper,
            staking,
            bank,
            events,
        }
    }
}
