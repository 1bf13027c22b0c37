//! Store key layout
//!
//! Every record lives under a one-byte prefix. Historic records are keyed by
//! [`PriceKey`], a `(denom, block)` pair whose byte encoding sorts exactly
//! like its [`Ord`] implementation:
//!
//! ```text
//! prefix | len(denom): u8 | denom bytes | block: u64 big-endian
//! ```
//!
//! The length byte keeps `"CHEQ"` records from interleaving with `"CHEQX"`
//! ones, so a prefix scan over one denom never sees another.

use super::address::{ValAddress, ADDRESS_LEN};
use super::error::{OracleError, OracleResult};
use std::cmp::Ordering;

pub const PREFIX_EXCHANGE_RATE: u8 = 0x01;
pub const PREFIX_FEEDER_DELEGATION: u8 = 0x02;
pub const PREFIX_MISS_COUNTER: u8 = 0x03;
pub const PREFIX_AGGREGATE_PREVOTE: u8 = 0x04;
pub const PREFIX_AGGREGATE_VOTE: u8 = 0x05;
pub const PREFIX_MEDIAN: u8 = 0x06;
pub const PREFIX_MEDIAN_DEVIATION: u8 = 0x07;
pub const PREFIX_HISTORIC_PRICE: u8 = 0x08;
pub const PREFIX_VALIDATOR_REWARD_SET: u8 = 0x09;
pub const PREFIX_PARAM_UPDATE_PLAN: u8 = 0x10;
pub const PREFIX_PARAMS: u8 = 0x11;
pub const PREFIX_AVERAGE: u8 = 0x12;
pub const PREFIX_LAST_HISTORIC_BLOCK: u8 = 0x13;

fn denom_key(prefix: u8, denom: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(1 + denom.len());
    key.push(prefix);
    key.extend_from_slice(denom.as_bytes());
    key
}

fn address_key(prefix: u8, addr: &ValAddress) -> Vec<u8> {
    let mut key = Vec::with_capacity(1 + ADDRESS_LEN);
    key.push(prefix);
    key.extend_from_slice(addr.as_bytes());
    key
}

pub fn exchange_rate_key(symbol: &str) -> Vec<u8> {
    denom_key(PREFIX_EXCHANGE_RATE, symbol)
}

pub fn feeder_delegation_key(operator: &ValAddress) -> Vec<u8> {
    address_key(PREFIX_FEEDER_DELEGATION, operator)
}

pub fn miss_counter_key(operator: &ValAddress) -> Vec<u8> {
    address_key(PREFIX_MISS_COUNTER, operator)
}

pub fn aggregate_prevote_key(voter: &ValAddress) -> Vec<u8> {
    address_key(PREFIX_AGGREGATE_PREVOTE, voter)
}

pub fn aggregate_vote_key(voter: &ValAddress) -> Vec<u8> {
    address_key(PREFIX_AGGREGATE_VOTE, voter)
}

pub fn validator_reward_set_key() -> Vec<u8> {
    vec![PREFIX_VALIDATOR_REWARD_SET]
}

pub fn params_key() -> Vec<u8> {
    vec![PREFIX_PARAMS]
}

pub fn param_update_plan_key(height: u64) -> Vec<u8> {
    let mut key = Vec::with_capacity(9);
    key.push(PREFIX_PARAM_UPDATE_PLAN);
    key.extend_from_slice(&height.to_be_bytes());
    key
}

pub fn last_historic_block_key(symbol: &str) -> Vec<u8> {
    denom_key(PREFIX_LAST_HISTORIC_BLOCK, symbol)
}

/// Strip a one-byte prefix and read the validator address that follows.
pub fn address_from_key(key: &[u8]) -> OracleResult<ValAddress> {
    if key.len() != 1 + ADDRESS_LEN {
        return Err(OracleError::Codec(format!(
            "address key must be {} bytes, got {}",
            1 + ADDRESS_LEN,
            key.len()
        )));
    }
    ValAddress::from_slice(&key[1..])
}

/// Strip a one-byte prefix and read the denom that follows.
pub fn denom_from_key(key: &[u8]) -> OracleResult<String> {
    let rest = key
        .get(1..)
        .ok_or_else(|| OracleError::Codec("empty key".into()))?;
    String::from_utf8(rest.to_vec()).map_err(|e| OracleError::Codec(e.to_string()))
}

/// Which moving average a stored value belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AverageKind {
    Sma,
    Ema,
    Wma(super::averages::WmaStrategy),
}

impl AverageKind {
    fn tag(&self) -> &'static [u8] {
        use super::averages::WmaStrategy;
        match self {
            AverageKind::Sma => b"sma",
            AverageKind::Ema => b"ema",
            AverageKind::Wma(WmaStrategy::Oldest) => b"wma_oldest",
            AverageKind::Wma(WmaStrategy::Recent) => b"wma_recent",
            AverageKind::Wma(WmaStrategy::Balanced) => b"wma_balanced",
            AverageKind::Wma(WmaStrategy::Custom) => b"wma_custom",
        }
    }
}

pub fn average_key(kind: AverageKind, symbol: &str) -> Vec<u8> {
    let tag = kind.tag();
    let mut key = Vec::with_capacity(2 + tag.len() + symbol.len());
    key.push(PREFIX_AVERAGE);
    key.push(tag.len() as u8);
    key.extend_from_slice(tag);
    key.extend_from_slice(symbol.as_bytes());
    key
}

/// Composite `(denom, block)` key for historic prices, medians and deviations.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PriceKey {
    pub denom: String,
    pub block: u64,
}

impl PriceKey {
    pub fn new(denom: impl Into<String>, block: u64) -> Self {
        Self {
            denom: denom.into(),
            block,
        }
    }

    /// Key bytes under `prefix`. Denoms longer than 255 bytes are rejected.
    pub fn encode(&self, prefix: u8) -> OracleResult<Vec<u8>> {
        let mut key = Self::denom_prefix(prefix, &self.denom)?;
        key.extend_from_slice(&self.block.to_be_bytes());
        Ok(key)
    }

    /// Shared prefix of every key for `denom` under `prefix`.
    pub fn denom_prefix(prefix: u8, denom: &str) -> OracleResult<Vec<u8>> {
        let len = u8::try_from(denom.len())
            .map_err(|_| OracleError::Codec(format!("denom too long: {}", denom.len())))?;
        let mut key = Vec::with_capacity(2 + denom.len() + 8);
        key.push(prefix);
        key.push(len);
        key.extend_from_slice(denom.as_bytes());
        Ok(key)
    }

    pub fn decode(bytes: &[u8]) -> OracleResult<Self> {
        let len = *bytes
            .get(1)
            .ok_or_else(|| OracleError::Codec("price key too short".into()))? as usize;
        if bytes.len() != 2 + len + 8 {
            return Err(OracleError::Codec(format!(
                "price key length {} does not match denom length {}",
                bytes.len(),
                len
            )));
        }
        let denom = String::from_utf8(bytes[2..2 + len].to_vec())
            .map_err(|e| OracleError::Codec(e.to_string()))?;
        let mut block = [0u8; 8];
        block.copy_from_slice(&bytes[2 + len..]);
        Ok(Self {
            denom,
            block: u64::from_be_bytes(block),
        })
    }
}

impl Ord for PriceKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.denom
            .len()
            .cmp(&other.denom.len())
            .then_with(|| self.denom.as_bytes().cmp(other.denom.as_bytes()))
            .then_with(|| self.block.cmp(&other.block))
    }
}

impl PartialOrd for PriceKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
