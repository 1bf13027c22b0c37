//! Message server
//!
//! Reference: commit-reveal submission, feeder delegation and governance.

use super::ensure_authority;
use crate::domain::{
    parse_exchange_rates, AggregateExchangeRatePrevote, AggregateExchangeRateVote,
    MsgAggregateExchangeRatePrevote, MsgAggregateExchangeRateVote, MsgDelegateFeedConsent,
    MsgGovAddDenoms, MsgGovCancelUpdateParamPlan, MsgGovRemoveCurrencyDeviationThresholds,
    MsgGovRemoveCurrencyPairProviders, MsgGovUpdateParams, MsgLegacyGovUpdateParams, OracleError,
    OracleResult, ParamKey, ParamUpdatePlan, Params, VoteHash, VoteProvenance,
};
use crate::events::OracleEvent;
use crate::keeper::OracleKeeper;
use crate::ports::KeyValueStore;
use tracing::{debug, info};

/// Handles oracle messages included at `height`.
pub struct OracleMsgServer<'k, S: KeyValueStore> {
    keeper: &'k mut OracleKeeper<S>,
    height: u64,
}

impl<'k, S: KeyValueStore> OracleMsgServer<'k, S> {
    pub fn new(keeper: &'k mut OracleKeeper<S>, height: u64) -> Self {
        Self { keeper, height }
    }

    // === COMMIT-REVEAL ===

    /// Commit to a vote for the next reveal period.
    pub fn aggregate_exchange_rate_prevote(
        &mut self,
        msg: &MsgAggregateExchangeRatePrevote,
    ) -> OracleResult<()> {
        msg.validate_basic()?;
        self.keeper.validate_feeder(&msg.feeder, &msg.validator)?;

        if self.keeper.has_aggregate_prevote(&msg.validator)? {
            return Err(OracleError::ExistingPrevote);
        }

        let prevote = AggregateExchangeRatePrevote {
            hash: msg.vote_hash()?,
            voter: msg.validator,
            submit_block: self.height,
        };
        self.keeper.set_aggregate_prevote(&msg.validator, &prevote)?;
        debug!(subsystem = "oracle", validator = %msg.validator, height = self.height, "prevote stored");
        Ok(())
    }

    /// Reveal a vote committed exactly one vote period earlier.
    pub fn aggregate_exchange_rate_vote(
        &mut self,
        msg: &MsgAggregateExchangeRateVote,
    ) -> OracleResult<()> {
        msg.validate_basic()?;
        self.keeper.validate_feeder(&msg.feeder, &msg.validator)?;

        let params = self.keeper.params()?;
        let prevote = self.keeper.aggregate_prevote(&msg.validator)?;

        let current_period = self.height / params.vote_period;
        let prevote_period = prevote.submit_block / params.vote_period;
        if current_period.checked_sub(prevote_period) != Some(1) {
            return Err(OracleError::RevealPeriodMissMatch);
        }

        let rates = parse_exchange_rates(&msg.exchange_rates)?;

        let hash = VoteHash::aggregate(&msg.salt, &msg.exchange_rates, &msg.validator);
        if hash != prevote.hash {
            return Err(OracleError::VerificationFailed {
                expected: prevote.hash.to_string(),
                actual: hash.to_string(),
            });
        }

        let exchange_rates = rates
            .into_iter()
            .filter(|r| params.accept_list.contains(&r.denom))
            .collect();
        let vote = AggregateExchangeRateVote {
            exchange_rates,
            voter: msg.validator,
            provenance: VoteProvenance::CommitReveal {
                prevote_block: prevote.submit_block,
                revealed_at: self.height,
            },
        };
        self.keeper.set_aggregate_vote(&msg.validator, &vote)?;
        self.keeper.delete_aggregate_prevote(&msg.validator)
    }

    /// Let `delegate` submit votes on behalf of `operator`.
    pub fn delegate_feed_consent(&mut self, msg: &MsgDelegateFeedConsent) -> OracleResult<()> {
        let exists = self
            .keeper
            .staking()
            .validator(&msg.operator)
            .map_err(OracleError::Staking)?
            .is_some();
        if !exists {
            return Err(OracleError::ValidatorNotFound(msg.operator.to_string()));
        }

        self.keeper.set_feeder_delegation(&msg.operator, &msg.delegate)?;
        self.keeper.emit(OracleEvent::DelegateFeedConsent {
            operator: msg.operator,
            delegate: msg.delegate,
        });
        Ok(())
    }

    // === GOVERNANCE ===

    /// Schedule a parameter update plan.
    pub fn gov_update_params(&mut self, msg: &MsgGovUpdateParams) -> OracleResult<()> {
        ensure_authority(self.keeper.authority(), &msg.authority)?;
        msg.validate_basic()?;
        self.keeper.schedule_param_update_plan(&msg.plan, self.height)?;
        info!(subsystem = "oracle", plan_height = msg.plan.height, keys = ?msg.plan.keys, "param update plan scheduled");
        Ok(())
    }

    /// Schedule the addition of new assets to the accept list, and to the
    /// mandatory list when `mandatory` is set.
    pub fn gov_add_denoms(&mut self, msg: &MsgGovAddDenoms) -> OracleResult<()> {
        ensure_authority(self.keeper.authority(), &msg.authority)?;
        msg.validate_basic()?;

        let mut plan = ParamUpdatePlan::new(Vec::new(), msg.height, self.keeper.params()?);
        let changes = &mut plan.changes;
        let mut keys = Vec::new();

        for denom in &msg.denom_list {
            let symbol = &denom.symbol_denom;
            if changes.accept_list.contains(symbol) && !msg.mandatory {
                return Err(OracleError::InvalidParamValue(format!(
                    "denom already exists in acceptList: {symbol}"
                )));
            }
            if changes.mandatory_list.contains(symbol) && msg.mandatory {
                return Err(OracleError::InvalidParamValue(format!(
                    "denom already exists in mandatoryList: {symbol}"
                )));
            }

            if !changes.accept_list.contains(symbol) {
                changes.accept_list.push(denom.clone());
                keys.push(ParamKey::AcceptList);
            }
            if msg.mandatory {
                changes.mandatory_list.push(denom.clone());
                keys.push(ParamKey::MandatoryList);
            }

            if changes.reward_bands.band_for(symbol).is_err() {
                match msg.reward_band {
                    Some(band) => changes.reward_bands.add(symbol.clone(), band),
                    None => changes.reward_bands.add_default(symbol.clone()),
                }
            }
        }

        if !msg.currency_pair_providers.is_empty() {
            changes
                .currency_pair_providers
                .0
                .extend(msg.currency_pair_providers.iter().cloned());
            keys.push(ParamKey::CurrencyPairProviders);
        }
        if !msg.currency_deviation_thresholds.is_empty() {
            changes
                .currency_deviation_thresholds
                .0
                .extend(msg.currency_deviation_thresholds.iter().cloned());
            keys.push(ParamKey::CurrencyDeviationThresholds);
        }
        if !msg.denom_list.is_empty() {
            keys.push(ParamKey::RewardBands);
        }

        for key in keys {
            plan.push_key(key);
        }
        plan.validate_basic()?;
        self.keeper.schedule_param_update_plan(&plan, self.height)
    }

    /// Schedule removal of currency pair providers matching on base and quote.
    pub fn gov_remove_currency_pair_providers(
        &mut self,
        msg: &MsgGovRemoveCurrencyPairProviders,
    ) -> OracleResult<()> {
        ensure_authority(self.keeper.authority(), &msg.authority)?;
        msg.validate_basic()?;

        let mut changes = self.keeper.params()?;
        for pair in &msg.currency_pair_providers {
            changes.currency_pair_providers = changes.currency_pair_providers.remove_pair(pair);
        }
        let plan = ParamUpdatePlan::new(
            vec![ParamKey::CurrencyPairProviders.as_str().to_string()],
            msg.height,
            changes,
        );
        plan.validate_basic()?;
        self.keeper.schedule_param_update_plan(&plan, self.height)
    }

    /// Schedule removal of deviation thresholds by base denom.
    pub fn gov_remove_currency_deviation_thresholds(
        &mut self,
        msg: &MsgGovRemoveCurrencyDeviationThresholds,
    ) -> OracleResult<()> {
        ensure_authority(self.keeper.authority(), &msg.authority)?;
        msg.validate_basic()?;

        let mut changes = self.keeper.params()?;
        for currency in &msg.currencies {
            changes.currency_deviation_thresholds = changes
                .currency_deviation_thresholds
                .remove_base(&currency.to_uppercase());
        }
        let plan = ParamUpdatePlan::new(
            vec![ParamKey::CurrencyDeviationThresholds.as_str().to_string()],
            msg.height,
            changes,
        );
        plan.validate_basic()?;
        self.keeper.schedule_param_update_plan(&plan, self.height)
    }

    pub fn gov_cancel_update_param_plan(
        &mut self,
        msg: &MsgGovCancelUpdateParamPlan,
    ) -> OracleResult<()> {
        ensure_authority(self.keeper.authority(), &msg.authority)?;
        msg.validate_basic()?;
        self.keeper.clear_param_update_plan(msg.height)
    }

    /// Apply parameter changes immediately.
    ///
    /// Each key is checked against the params as updated by the keys before it.
    pub fn legacy_gov_update_params(&mut self, msg: &MsgLegacyGovUpdateParams) -> OracleResult<()> {
        ensure_authority(self.keeper.authority(), &msg.authority)?;
        msg.validate_basic()?;

        let mut params = self.keeper.params()?;
        for key in &msg.keys {
            let key: ParamKey = key.parse()?;
            check_dependent_param(&params, key, &msg.changes)?;
            params.apply_key(key, &msg.changes);
        }
        self.keeper.set_params(&params)
    }
}

fn dependent(msg: &str) -> OracleError {
    OracleError::InvalidParamValue(msg.to_string())
}

/// Cross-parameter checks for applying `key` from `changes` onto `current`.
fn check_dependent_param(current: &Params, key: ParamKey, changes: &Params) -> OracleResult<()> {
    match key {
        ParamKey::RewardDistributionWindow
            if changes.reward_distribution_window < current.vote_period =>
        {
            Err(dependent(
                "oracle parameter RewardDistributionWindow must be greater than or equal with VotePeriod",
            ))
        }
        ParamKey::SlashWindow if changes.slash_window < current.vote_period => Err(dependent(
            "oracle parameter SlashWindow must be greater than or equal with VotePeriod",
        )),
        ParamKey::AcceptList
            if !changes
                .accept_list
                .normalize()
                .contain_denoms(&current.mandatory_list.normalize()) =>
        {
            Err(dependent("denom in MandatoryList not present in AcceptList"))
        }
        ParamKey::MandatoryList
            if !current
                .accept_list
                .normalize()
                .contain_denoms(&changes.mandatory_list.normalize()) =>
        {
            Err(dependent("denom in MandatoryList not present in AcceptList"))
        }
        ParamKey::HistoricStampPeriod => {
            let v = changes.historic_stamp_period;
            if v < 1 {
                Err(dependent("oracle parameters HistoricStampPeriod must be greater than 0"))
            } else if v > current.median_stamp_period {
                Err(dependent(
                    "oracle parameter HistoricStampPeriod must be less than or equal with MedianStampPeriod",
                ))
            } else if v % current.vote_period != 0 {
                Err(dependent(
                    "oracle parameters HistoricStampPeriod must be exact multiples of VotePeriod",
                ))
            } else {
                Ok(())
            }
        }
        ParamKey::MedianStampPeriod => {
            let v = changes.median_stamp_period;
            if v < 1 {
                Err(dependent("oracle parameters MedianStampPeriod must be greater than 0"))
            } else if v < current.historic_stamp_period {
                Err(dependent(
                    "oracle parameter MedianStampPeriod must be greater than or equal with HistoricStampPeriod",
                ))
            } else if v % current.vote_period != 0 {
                Err(dependent(
                    "oracle parameters MedianStampPeriod must be exact multiples of VotePeriod",
                ))
            } else {
                Ok(())
            }
        }
        _ => changes.validate_key(key),
    }
}
