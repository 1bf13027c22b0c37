//! Miss-counter slashing and the reward-eligible validator set

use super::OracleKeeper;
use crate::domain::{
    decimal, validator_reward_set_key, Decimal, OracleError, OracleResult, ValAddress,
};
use crate::events::OracleEvent;
use crate::ports::KeyValueStore;
use tracing::{info, warn};

impl<S: KeyValueStore> OracleKeeper<S> {
    /// Mandatory-denom votes a validator could win over one slash window.
    pub fn possible_wins_per_slash_window(&self) -> OracleResult<u64> {
        let params = self.params()?;
        Ok(params.vote_periods_per_window() * params.mandatory_list.len() as u64)
    }

    /// Slash and jail every bonded validator whose valid-vote rate fell under
    /// `MinValidPerWindow`, then reset all miss counters.
    pub fn slash_and_reset_miss_counters(&mut self, height: u64) -> OracleResult<()> {
        let params = self.params()?;
        let possible_wins = self.possible_wins_per_slash_window()?;
        let infraction_height = height
            .saturating_sub(self.staking().validator_update_delay())
            .saturating_sub(1);
        let power_reduction = self.staking().power_reduction();

        for (operator, misses) in self.miss_counters()? {
            if possible_wins > 0 {
                let valid = Decimal::from(possible_wins) - Decimal::from(misses.min(possible_wins));
                let rate = decimal::checked_div(valid, Decimal::from(possible_wins))?;
                if rate < params.min_valid_per_window && params.slashing_enabled {
                    self.slash_validator(
                        &operator,
                        infraction_height,
                        power_reduction,
                        params.slash_fraction,
                    )?;
                }
            }
            self.delete_miss_counter(&operator)?;
        }
        Ok(())
    }

    fn slash_validator(
        &self,
        operator: &ValAddress,
        infraction_height: u64,
        power_reduction: u128,
        fraction: Decimal,
    ) -> OracleResult<()> {
        let validator = match self.staking().validator(operator) {
            Ok(Some(v)) if v.bonded && !v.jailed => v,
            Ok(_) => return Ok(()),
            Err(e) => {
                warn!(subsystem = "oracle", validator = %operator, error = %e, "validator lookup failed, not slashing");
                return Ok(());
            }
        };

        let power = validator.consensus_power(power_reduction);
        self.staking()
            .slash(&validator.cons_address, infraction_height, power, fraction)
            .map_err(OracleError::Staking)?;
        self.staking()
            .jail(&validator.cons_address)
            .map_err(OracleError::Staking)?;

        info!(
            subsystem = "oracle",
            validator = %operator,
            height = infraction_height,
            %fraction,
            "validator slashed and jailed for missing oracle votes"
        );
        crate::metrics::record_validator_slashed();
        self.emit(OracleEvent::ValidatorSlashed {
            validator: *operator,
            fraction,
            height: infraction_height,
        });
        Ok(())
    }

    /// Snapshot the bonded validators as the reward set for the new slash window.
    pub fn set_validator_reward_set(&mut self) -> OracleResult<()> {
        let set: Vec<ValAddress> = self
            .staking()
            .bonded_validators_by_power()
            .map_err(OracleError::Staking)?
            .into_iter()
            .map(|v| v.operator)
            .collect();
        self.put_value(&validator_reward_set_key(), &set)
    }

    /// Current reward set; empty before the first snapshot.
    pub fn validator_reward_set(&self) -> OracleResult<Vec<ValAddress>> {
        Ok(self
            .get_value(&validator_reward_set_key())?
            .unwrap_or_default())
    }
}
