//! EndBlock: plan execution, feeder supervision, tally, slashing, pruning

use super::OracleApp;
use crate::domain::{
    claim_map_to_slices, decimal, Claim, Decimal, ExchangeRateBallot, OracleError, OracleResult,
    Params, ValAddress,
};
use crate::keeper::{is_period_last_block, OracleKeeper};
use crate::ports::KeyValueStore;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Scale applied to both the vote threshold and ballot support.
const MAX_VOTE_THRESHOLD_MULTIPLIER: i64 = 100;

impl<S: KeyValueStore> OracleApp<S> {
    /// Run the oracle's end-of-block work for `height`.
    pub fn end_block(&mut self, height: u64) -> OracleResult<()> {
        let executed = self.keeper.execute_due_param_update_plans(height)?;
        if executed > 0 {
            info!(subsystem = "oracle", height, plans = executed, "param update plans executed");
        }

        let params = self.keeper.params()?;

        if let Some(feeder) = self.feeder.as_ref() {
            if feeder.is_enabled() && !feeder.is_started() {
                if let Err(e) = feeder.start(height, &params) {
                    warn!(subsystem = "oracle", height, error = %e, "error starting price feeder");
                }
            }
        }

        if is_period_last_block(height, params.slash_window + 1) {
            self.keeper.set_validator_reward_set()?;
        }

        if is_period_last_block(height, params.vote_period) {
            self.tick_feeder(height, &params);
            calc_prices(&mut self.keeper, height, &params)?;

            if is_period_last_block(height, params.historic_stamp_period * params.averaging_window) {
                for denom in params.accept_list.iter() {
                    self.keeper.compute_averages(&denom.symbol_denom)?;
                }
            }
        }

        if is_period_last_block(height, params.slash_window) {
            self.keeper.slash_and_reset_miss_counters(height)?;
        }

        self.keeper.prune_all_prices(height)
    }

    fn tick_feeder(&self, height: u64, params: &Params) {
        let Some(feeder) = self.feeder.as_ref().filter(|f| f.is_enabled() && f.is_started()) else {
            return;
        };
        if let Err(e) = feeder.tick(height, params) {
            warn!(subsystem = "oracle", height, error = %e, "error in price feeder tick");
        }
    }
}

/// Tally every ballot of the closing vote period, write consensus rates,
/// count misses, pay winners and clear the period's votes.
pub fn calc_prices<S: KeyValueStore>(
    keeper: &mut OracleKeeper<S>,
    height: u64,
    params: &Params,
) -> OracleResult<()> {
    let power_reduction = keeper.staking().power_reduction();
    let mut claims: BTreeMap<ValAddress, Claim> = BTreeMap::new();
    let mut total_bonded_power: i64 = 0;
    for validator in keeper
        .staking()
        .bonded_validators_by_power()
        .map_err(OracleError::Staking)?
    {
        let power = validator.consensus_power(power_reduction);
        total_bonded_power = total_bonded_power.saturating_add(power);
        claims.insert(
            validator.operator,
            Claim::new(power, 0, 0, validator.operator),
        );
    }

    let vote_targets: Vec<String> = params
        .accept_list
        .iter()
        .map(|d| d.base_denom.clone())
        .collect();

    keeper.clear_exchange_rates()?;

    let ballots = keeper.organize_ballot_by_denom(&claims)?;
    let threshold = decimal::checked_mul(
        params.vote_threshold,
        Decimal::from(MAX_VOTE_THRESHOLD_MULTIPLIER),
    )?
    .trunc();

    for ballot_denom in &ballots {
        let denom = ballot_denom.denom.as_str();
        let increment_win = params.mandatory_list.contains(denom);

        if !increment_win && !params.accept_list.contains(denom) {
            info!(subsystem = "oracle", height, %denom, "unsupported denom, dropping ballot");
            crate::metrics::record_ballot_dropped(denom, "unsupported");
            continue;
        }

        let support = if total_bonded_power > 0 {
            Decimal::from(ballot_denom.ballot.power() * MAX_VOTE_THRESHOLD_MULTIPLIER / total_bonded_power)
        } else {
            Decimal::ZERO
        };
        if support < threshold {
            info!(
                subsystem = "oracle",
                height,
                %denom,
                %support,
                %threshold,
                "ballot voting power is under vote threshold, dropping ballot"
            );
            crate::metrics::record_ballot_dropped(denom, "below_threshold");
            continue;
        }

        let reward_band = params.reward_bands.band_for(denom)?;
        let rate = tally(&ballot_denom.ballot, reward_band, &mut claims, increment_win)?;
        keeper.set_exchange_rate_with_event(denom, rate)?;

        if is_period_last_block(height, params.historic_stamp_period) {
            keeper.add_historic_price(denom, height, rate)?;
        }
        if is_period_last_block(height, params.median_stamp_period) {
            keeper.calc_and_set_historic_median(denom, height)?;
        }
    }

    let reward_set = keeper.validator_reward_set()?;
    let mandatory = params.mandatory_list.len() as i64;
    let (all_claims, rewarded) = claim_map_to_slices(&claims, &reward_set);
    for claim in &all_claims {
        let misses = mandatory.saturating_sub(claim.mandatory_win_count).max(0) as u64;
        if misses == 0 {
            continue;
        }
        let count = keeper.miss_counter(&claim.recipient)?;
        keeper.set_miss_counter(&claim.recipient, count + misses)?;
    }

    keeper.reward_ballot_winners(
        params.vote_period,
        params.reward_distribution_window,
        &vote_targets,
        &rewarded,
    )?;

    keeper.clear_ballots(height, params.vote_period)?;
    debug!(subsystem = "oracle", height, ballots = ballots.len(), "prices calculated");
    Ok(())
}

/// Weighted median of a sorted ballot. Voters within the reward spread of
/// the median, or with a non-positive rate, gain weight and (for mandatory
/// denoms) a win.
///
/// `reward_spread = max(median * reward_band / 2, standard_deviation)`
pub fn tally(
    ballot: &ExchangeRateBallot,
    reward_band: Decimal,
    claims: &mut BTreeMap<ValAddress, Claim>,
    increment_win: bool,
) -> OracleResult<Decimal> {
    let median = ballot.weighted_median()?;
    let standard_deviation = ballot.standard_deviation()?;

    let half_band = decimal::checked_div(reward_band, Decimal::TWO)?;
    let reward_spread = decimal::checked_mul(median, half_band)?.max(standard_deviation);
    let low = decimal::checked_sub(median, reward_spread)?;
    let high = decimal::checked_add(median, reward_spread)?;

    for vote in ballot.iter() {
        let rate = vote.exchange_rate;
        if (rate >= low && rate <= high) || rate <= Decimal::ZERO {
            let claim = claims
                .entry(vote.voter)
                .or_insert_with(|| Claim::new(0, 0, 0, vote.voter));
            if increment_win {
                claim.mandatory_win_count += 1;
            }
            claim.weight += vote.power;
        }
    }

    Ok(median)
}
