//! In-memory bank and distribution modules

use crate::domain::{Coin, ValAddress};
use crate::ports::BankKeeper;
use parking_lot::RwLock;
use std::collections::BTreeMap;

/// Tracks the oracle module balance, the distribution module balance and
/// per-validator allocations.
#[derive(Default)]
pub struct InMemoryBankKeeper {
    module: RwLock<BTreeMap<String, u128>>,
    distribution: RwLock<BTreeMap<String, u128>>,
    allocations: RwLock<BTreeMap<ValAddress, BTreeMap<String, u128>>>,
}

impl InMemoryBankKeeper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit the oracle module account, e.g. to fund the reward pool.
    pub fn fund_module(&self, coin: Coin) {
        *self.module.write().entry(coin.denom).or_default() += coin.amount;
    }

    pub fn distribution_balance(&self, denom: &str) -> u128 {
        self.distribution.read().get(denom).copied().unwrap_or(0)
    }

    pub fn allocated_to(&self, operator: &ValAddress, denom: &str) -> u128 {
        self.allocations
            .read()
            .get(operator)
            .and_then(|coins| coins.get(denom))
            .copied()
            .unwrap_or(0)
    }
}

impl BankKeeper for InMemoryBankKeeper {
    fn module_balance(&self, denom: &str) -> Result<u128, String> {
        Ok(self.module.read().get(denom).copied().unwrap_or(0))
    }

    fn send_to_distribution(&self, coins: &[Coin]) -> Result<(), String> {
        let mut module = self.module.write();
        for coin in coins {
            let balance = module.get(&coin.denom).copied().unwrap_or(0);
            if balance < coin.amount {
                return Err(format!(
                    "insufficient funds: {}{} < {}",
                    balance, coin.denom, coin
                ));
            }
        }
        let mut distribution = self.distribution.write();
        for coin in coins {
            if let Some(balance) = module.get_mut(&coin.denom) {
                *balance -= coin.amount;
            }
            *distribution.entry(coin.denom.clone()).or_default() += coin.amount;
        }
        Ok(())
    }

    fn allocate_tokens_to_validator(
        &self,
        operator: &ValAddress,
        coins: &[Coin],
    ) -> Result<(), String> {
        let mut allocations = self.allocations.write();
        let entry = allocations.entry(*operator).or_default();
        for coin in coins {
            *entry.entry(coin.denom.clone()).or_default() += coin.amount;
        }
        Ok(())
    }
}
