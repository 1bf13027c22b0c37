//! Reward distribution to ballot winners

use super::OracleKeeper;
use crate::domain::{
    decimal, normalize_coins, Claim, Coin, Coins, Decimal, OracleError, OracleResult,
    CHEQD_DENOM,
};
use crate::events::OracleEvent;
use crate::ports::KeyValueStore;
use tracing::{debug, info};

/// Share of a winner's reward kept after misses.
///
/// `1 - ln(miss - min + 1) / ln(max - min + 1)`, where `min` is the smallest
/// miss count among the winners. The validator with the fewest misses gets 1;
/// when `max <= min` everyone gets 1. The result is clamped to `[0, 1]`.
pub fn reward_factor(miss_count: u64, max_miss_count: u64, min_miss_count: u64) -> OracleResult<Decimal> {
    if max_miss_count <= min_miss_count || miss_count <= min_miss_count {
        return Ok(Decimal::ONE);
    }
    let numerator = decimal::checked_ln(Decimal::from(miss_count - min_miss_count + 1))?;
    let denominator = decimal::checked_ln(Decimal::from(max_miss_count - min_miss_count + 1))?;
    let factor = decimal::checked_sub(Decimal::ONE, decimal::checked_div(numerator, denominator)?)?;
    Ok(factor.clamp(Decimal::ZERO, Decimal::ONE))
}

/// Native denom first, then every vote target not already listed.
fn reward_denoms(vote_targets: &[String]) -> Vec<String> {
    if vote_targets.iter().any(|d| d == CHEQD_DENOM) {
        return vote_targets.to_vec();
    }
    std::iter::once(CHEQD_DENOM.to_string())
        .chain(vote_targets.iter().cloned())
        .collect()
}

impl<S: KeyValueStore> OracleKeeper<S> {
    /// Pay a `vote_period / reward_distribution_window` slice of every reward
    /// pool to `winners`, scaled by each winner's reward factor.
    ///
    /// `vote_targets` are base denoms. The paid total leaves the oracle module
    /// in a single transfer to the distribution module.
    pub fn reward_ballot_winners(
        &mut self,
        vote_period: u64,
        reward_distribution_window: u64,
        vote_targets: &[String],
        winners: &[Claim],
    ) -> OracleResult<()> {
        if winners.is_empty() {
            return Ok(());
        }

        let ratio = decimal::checked_div(
            Decimal::from(vote_period),
            Decimal::from(reward_distribution_window),
        )?;
        let mut period_rewards: Vec<(String, Decimal)> = Vec::new();
        for denom in reward_denoms(vote_targets) {
            let pool = self.bank().module_balance(&denom).map_err(OracleError::Bank)?;
            if pool == 0 {
                continue;
            }
            let reward = decimal::checked_mul(decimal::from_amount(pool)?, ratio)?;
            period_rewards.push((denom, reward));
        }

        let params = self.params()?;
        let max_miss_count = vote_targets.len() as u64 * params.vote_periods_per_window();
        let mut min_miss_count = u64::MAX;
        for winner in winners {
            min_miss_count = min_miss_count.min(self.miss_counter(&winner.recipient)?);
        }
        let share_divisor = Decimal::from(winners.len() as u64);

        let mut distributed: Coins = Vec::new();
        for winner in winners {
            let exists = self
                .staking()
                .validator(&winner.recipient)
                .map_err(OracleError::Staking)?
                .is_some();
            if !exists {
                debug!(subsystem = "oracle", validator = %winner.recipient, "reward recipient not found, skipping");
                continue;
            }

            let misses = self.miss_counter(&winner.recipient)?;
            let factor = reward_factor(misses, max_miss_count, min_miss_count)?;
            let share = decimal::checked_div(factor, share_divisor)?;

            let mut coins: Coins = Vec::new();
            for (denom, reward) in &period_rewards {
                let amount = decimal::truncate_to_amount(decimal::checked_mul(*reward, share)?)?;
                if amount > 0 {
                    coins.push(Coin::new(denom.clone(), amount));
                }
            }
            if coins.is_empty() {
                continue;
            }

            self.bank()
                .allocate_tokens_to_validator(&winner.recipient, &coins)
                .map_err(OracleError::Bank)?;
            distributed.extend(coins);
        }

        let distributed = normalize_coins(distributed)?;
        if distributed.is_empty() {
            return Ok(());
        }
        self.bank()
            .send_to_distribution(&distributed)
            .map_err(OracleError::Bank)?;

        info!(
            subsystem = "oracle",
            winners = winners.len(),
            total = ?distributed.iter().map(|c| c.to_string()).collect::<Vec<_>>(),
            "oracle rewards distributed"
        );
        crate::metrics::record_rewards_distributed(&distributed);
        self.emit(OracleEvent::RewardsDistributed { total: distributed });
        Ok(())
    }
}
