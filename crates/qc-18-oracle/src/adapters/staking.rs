//! In-memory validator set
//!
//! Stands in for the staking module in tests and local runs. Slashing burns
//! `fraction` of the validator's tokens; jailing flags the validator and
//! removes it from the bonded set.

use crate::domain::{decimal, ConsAddress, Decimal, ValAddress};
use crate::ports::{StakingKeeper, ValidatorInfo};
use parking_lot::RwLock;
use std::collections::BTreeMap;

/// Default tokens per unit of consensus power.
pub const DEFAULT_POWER_REDUCTION: u128 = 1_000_000;

/// One recorded `slash` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlashRecord {
    pub cons: ConsAddress,
    pub infraction_height: u64,
    pub power: i64,
    pub fraction: Decimal,
}

pub struct InMemoryStakingKeeper {
    validators: RwLock<BTreeMap<ValAddress, ValidatorInfo>>,
    slashes: RwLock<Vec<SlashRecord>>,
    power_reduction: u128,
}

impl InMemoryStakingKeeper {
    pub fn new() -> Self {
        Self::with_power_reduction(DEFAULT_POWER_REDUCTION)
    }

    pub fn with_power_reduction(power_reduction: u128) -> Self {
        Self {
            validators: RwLock::new(BTreeMap::new()),
            slashes: RwLock::new(Vec::new()),
            power_reduction,
        }
    }

    pub fn upsert(&self, validator: ValidatorInfo) {
        self.validators.write().insert(validator.operator, validator);
    }

    pub fn remove(&self, operator: &ValAddress) {
        self.validators.write().remove(operator);
    }

    pub fn slashes(&self) -> Vec<SlashRecord> {
        self.slashes.read().clone()
    }

    pub fn is_jailed(&self, operator: &ValAddress) -> bool {
        self.validators
            .read()
            .get(operator)
            .map(|v| v.jailed)
            .unwrap_or(false)
    }

    fn find_by_cons(&self, cons: &ConsAddress) -> Option<ValAddress> {
        self.validators
            .read()
            .values()
            .find(|v| &v.cons_address == cons)
            .map(|v| v.operator)
    }
}

impl Default for InMemoryStakingKeeper {
    fn default() -> Self {
        Self::new()
    }
}

impl StakingKeeper for InMemoryStakingKeeper {
    fn validator(&self, operator: &ValAddress) -> Result<Option<ValidatorInfo>, String> {
        Ok(self.validators.read().get(operator).cloned())
    }

    fn validator_by_cons_addr(&self, cons: &ConsAddress) -> Result<Option<ValidatorInfo>, String> {
        Ok(self
            .validators
            .read()
            .values()
            .find(|v| &v.cons_address == cons)
            .cloned())
    }

    fn bonded_validators_by_power(&self) -> Result<Vec<ValidatorInfo>, String> {
        let mut bonded: Vec<ValidatorInfo> = self
            .validators
            .read()
            .values()
            .filter(|v| v.bonded && !v.jailed)
            .cloned()
            .collect();
        bonded.sort_by(|a, b| b.tokens.cmp(&a.tokens).then(a.operator.cmp(&b.operator)));
        Ok(bonded)
    }

    fn total_bonded_tokens(&self) -> Result<u128, String> {
        Ok(self
            .validators
            .read()
            .values()
            .filter(|v| v.bonded && !v.jailed)
            .map(|v| v.tokens)
            .sum())
    }

    fn power_reduction(&self) -> u128 {
        self.power_reduction
    }

    fn slash(
        &self,
        cons: &ConsAddress,
        infraction_height: u64,
        power: i64,
        fraction: Decimal,
    ) -> Result<(), String> {
        let operator = self
            .find_by_cons(cons)
            .ok_or_else(|| format!("no validator with consensus address {cons}"))?;

        let mut validators = self.validators.write();
        if let Some(v) = validators.get_mut(&operator) {
            let tokens = decimal::from_amount(v.tokens).map_err(|e| e.to_string())?;
            let burned = decimal::checked_mul(tokens, fraction)
                .and_then(decimal::truncate_to_amount)
                .map_err(|e| e.to_string())?;
            v.tokens = v.tokens.saturating_sub(burned);
        }
        self.slashes.write().push(SlashRecord {
            cons: *cons,
            infraction_height,
            power,
            fraction,
        });
        Ok(())
    }

    fn jail(&self, cons: &ConsAddress) -> Result<(), String> {
        let operator = self
            .find_by_cons(cons)
            .ok_or_else(|| format!("no validator with consensus address {cons}"))?;
        if let Some(v) = self.validators.write().get_mut(&operator) {
            v.jailed = true;
        }
        Ok(())
    }
}
