//! Prevotes, votes and vote-extension payloads
//!
//! Reference: commit-reveal submission and ABCI++ vote extensions.
//!
//! # Vote hash
//!
//! `hash = SHA256("{salt}:{exchange_rates}:{voter}")[..20]`, hex-encoded
//! when carried in messages. The voter is rendered as lowercase hex.

use super::address::ValAddress;
use super::decimal::{parse_decimal, Decimal};
use super::error::{OracleError, OracleResult};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;
use std::fmt;

/// Truncated hash length in bytes.
pub const VOTE_HASH_LEN: usize = 20;

/// A single `(symbol, rate)` pair.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeRateTuple {
    pub denom: String,
    pub exchange_rate: Decimal,
}

impl ExchangeRateTuple {
    pub fn new(denom: impl Into<String>, exchange_rate: Decimal) -> Self {
        Self {
            denom: denom.into(),
            exchange_rate,
        }
    }
}

impl fmt::Display for ExchangeRateTuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.denom, self.exchange_rate)
    }
}

/// Parse `"DENOM:rate,DENOM:rate"` into tuples sorted by denom.
///
/// Denoms are uppercased. Rates must be non-negative decimals.
pub fn parse_exchange_rates(raw: &str) -> OracleResult<Vec<ExchangeRateTuple>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(Vec::new());
    }

    let mut seen = BTreeSet::new();
    let mut out = Vec::new();
    for tuple in raw.split(',') {
        let parts: Vec<&str> = tuple.split(':').collect();
        if parts.len() != 2 {
            return Err(OracleError::InvalidExchangeRate(format!(
                "invalid exchange rate {tuple}"
            )));
        }
        let denom = parts[0].trim().to_uppercase();
        if denom.is_empty() {
            return Err(OracleError::InvalidExchangeRate(format!(
                "invalid exchange rate {tuple}"
            )));
        }
        let rate = parse_decimal(parts[1])?;
        if rate.is_sign_negative() && !rate.is_zero() {
            return Err(OracleError::NegativeOrZeroRate);
        }
        if !seen.insert(denom.clone()) {
            return Err(OracleError::InvalidExchangeRate(format!(
                "duplicated denom {denom}"
            )));
        }
        out.push(ExchangeRateTuple::new(denom, rate));
    }

    out.sort_by(|a, b| a.denom.cmp(&b.denom));
    Ok(out)
}

/// Render tuples in the canonical `DENOM:rate,...` form.
pub fn format_exchange_rates(rates: &[ExchangeRateTuple]) -> String {
    rates
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

/// Truncated SHA-256 commitment to a vote.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteHash(pub [u8; VOTE_HASH_LEN]);

impl VoteHash {
    /// Commitment to `(salt, rates, voter)`; a pure function of its inputs.
    pub fn aggregate(salt: &str, exchange_rates: &str, voter: &ValAddress) -> Self {
        let payload = format!("{salt}:{exchange_rates}:{voter}");
        let digest = Sha256::digest(payload.as_bytes());
        let mut out = [0u8; VOTE_HASH_LEN];
        out.copy_from_slice(&digest[..VOTE_HASH_LEN]);
        VoteHash(out)
    }

    pub fn from_hex(raw: &str) -> OracleResult<Self> {
        let bytes = hex::decode(raw).map_err(|e| OracleError::InvalidHash(e.to_string()))?;
        let arr: [u8; VOTE_HASH_LEN] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| OracleError::InvalidHashLength {
                expected: VOTE_HASH_LEN,
            })?;
        Ok(VoteHash(arr))
    }
}

impl fmt::Display for VoteHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

/// First half of commit-reveal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateExchangeRatePrevote {
    pub hash: VoteHash,
    pub voter: ValAddress,
    pub submit_block: u64,
}

/// How a stored vote reached the store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum VoteProvenance {
    /// Revealed against a prevote submitted at `prevote_block`.
    CommitReveal { prevote_block: u64, revealed_at: u64 },
    /// Decoded from the extended commit of `height - 1` and injected at `height`.
    VoteExtension { height: u64 },
}

/// A validator's rates for the current vote period.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateExchangeRateVote {
    pub exchange_rates: Vec<ExchangeRateTuple>,
    pub voter: ValAddress,
    pub provenance: VoteProvenance,
}

impl AggregateExchangeRateVote {
    /// Same voter and same rates, regardless of provenance.
    pub fn same_ballot_as(&self, other: &AggregateExchangeRateVote) -> bool {
        self.voter == other.voter && self.exchange_rates == other.exchange_rates
    }
}

/// Payload a validator attaches to its precommit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OracleVoteExtension {
    pub height: u64,
    pub exchange_rates: Vec<ExchangeRateTuple>,
}

/// Pseudo-transaction the proposer prepends to the block.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InjectedVoteExtensionTx {
    pub exchange_rate_votes: Vec<AggregateExchangeRateVote>,
    pub extended_commit_info: Vec<u8>,
}
