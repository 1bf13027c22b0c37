//! Driven ports (Outbound dependencies)
//!
//! Everything the oracle needs from the rest of the node: the key-value
//! store, the validator set, the bank/distribution modules, the event bus,
//! the off-chain price feeder and a signature checker for vote extensions.

use crate::domain::{
    AccAddress, Coin, ConsAddress, Decimal, ExchangeRateTuple, KVStoreError, Params, ValAddress,
};
use crate::events::OracleEvent;
use crate::feeder::FeederError;
use async_trait::async_trait;

/// Single operation inside an atomic batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOperation {
    Put { key: Vec<u8>, value: Vec<u8> },
    Delete { key: Vec<u8> },
}

impl BatchOperation {
    pub fn put(key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> Self {
        Self::Put {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn delete(key: impl Into<Vec<u8>>) -> Self {
        Self::Delete { key: key.into() }
    }
}

/// Pagination window for prefix scans.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub offset: usize,
    /// Zero means unlimited.
    pub limit: usize,
    /// Iterate from the largest key down.
    pub reverse: bool,
}

impl PageRequest {
    pub fn forward(limit: usize) -> Self {
        Self {
            offset: 0,
            limit,
            reverse: false,
        }
    }

    pub fn reverse(limit: usize) -> Self {
        Self {
            offset: 0,
            limit,
            reverse: true,
        }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::forward(0)
    }
}

/// One page of scan results plus the number of matching keys overall.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Page {
    pub entries: Vec<(Vec<u8>, Vec<u8>)>,
    pub total: usize,
}

/// Abstract interface for the oracle's key-value store.
///
/// Keys returned by scans are always in ascending byte order.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, KVStoreError>;

    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<(), KVStoreError>;

    fn delete(&mut self, key: &[u8]) -> Result<(), KVStoreError>;

    /// All operations succeed or none are applied.
    fn atomic_batch_write(&mut self, operations: Vec<BatchOperation>) -> Result<(), KVStoreError>;

    fn exists(&self, key: &[u8]) -> Result<bool, KVStoreError> {
        Ok(self.get(key)?.is_some())
    }

    fn prefix_scan(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>, KVStoreError>;

    /// Prefix scan with direction, offset and limit.
    fn paged_scan(&self, prefix: &[u8], page: PageRequest) -> Result<Page, KVStoreError> {
        let mut entries = self.prefix_scan(prefix)?;
        let total = entries.len();
        if page.reverse {
            entries.reverse();
        }
        let entries = entries
            .into_iter()
            .skip(page.offset)
            .take(if page.limit == 0 { usize::MAX } else { page.limit })
            .collect();
        Ok(Page { entries, total })
    }
}

/// Snapshot of a validator as seen by the staking module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatorInfo {
    pub operator: ValAddress,
    pub cons_address: ConsAddress,
    /// SEC1-encoded secp256k1 consensus key.
    pub consensus_pubkey: Vec<u8>,
    pub tokens: u128,
    pub bonded: bool,
    pub jailed: bool,
}

impl ValidatorInfo {
    /// Tokens divided by the power reduction, saturating at `i64::MAX`.
    pub fn consensus_power(&self, power_reduction: u128) -> i64 {
        if power_reduction == 0 {
            return 0;
        }
        i64::try_from(self.tokens / power_reduction).unwrap_or(i64::MAX)
    }
}

/// Validator-set oracle
pub trait StakingKeeper: Send + Sync {
    fn validator(&self, operator: &ValAddress) -> Result<Option<ValidatorInfo>, String>;

    fn validator_by_cons_addr(&self, cons: &ConsAddress) -> Result<Option<ValidatorInfo>, String>;

    /// Bonded validators, highest power first.
    fn bonded_validators_by_power(&self) -> Result<Vec<ValidatorInfo>, String>;

    fn total_bonded_tokens(&self) -> Result<u128, String>;

    fn power_reduction(&self) -> u128;

    /// Blocks between a validator-set change and its effect.
    fn validator_update_delay(&self) -> u64 {
        1
    }

    fn slash(
        &self,
        cons: &ConsAddress,
        infraction_height: u64,
        power: i64,
        fraction: Decimal,
    ) -> Result<(), String>;

    fn jail(&self, cons: &ConsAddress) -> Result<(), String>;
}

/// Bank and distribution oracle
pub trait BankKeeper: Send + Sync {
    /// Balance of the oracle module account in `denom`.
    fn module_balance(&self, denom: &str) -> Result<u128, String>;

    /// Move coins from the oracle module account to the distribution module.
    fn send_to_distribution(&self, coins: &[Coin]) -> Result<(), String>;

    /// Credit a validator's outstanding rewards.
    fn allocate_tokens_to_validator(
        &self,
        operator: &ValAddress,
        coins: &[Coin],
    ) -> Result<(), String>;

    fn account_exists(&self, _address: &AccAddress) -> bool {
        true
    }
}

/// Event bus for oracle notifications
pub trait EventBus: Send + Sync {
    fn publish(&self, event: OracleEvent) -> Result<(), String>;
}

/// Off-chain price source driven from the end blocker.
#[async_trait]
pub trait PriceFeeder: Send + Sync {
    /// Called once, when the feeder task starts.
    async fn start(&self, height: u64, params: &Params) -> Result<(), FeederError>;

    /// Called at the end of every vote period.
    async fn tick(&self, height: u64, params: &Params) -> Result<(), FeederError>;

    /// Latest prices, possibly empty.
    fn prices(&self) -> Vec<ExchangeRateTuple>;
}

/// Signature checker for extended commit votes.
pub trait ExtensionSignatureVerifier: Send + Sync {
    fn verify(&self, public_key: &[u8], message: &[u8], signature: &[u8]) -> bool;
}
