//! Ballots and claims
//!
//! # Ordering
//!
//! A ballot is sorted by exchange rate ascending, ties broken by voter byte
//! order. [`ExchangeRateBallot::weighted_median`] and
//! [`ExchangeRateBallot::standard_deviation`] refuse unsorted input.

use super::address::ValAddress;
use super::decimal::{self, Decimal};
use super::error::{OracleError, OracleResult};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

/// One validator's rate for one denom, with its voting power.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VoteForTally {
    pub denom: String,
    pub exchange_rate: Decimal,
    pub voter: ValAddress,
    pub power: i64,
}

impl VoteForTally {
    pub fn new(exchange_rate: Decimal, denom: impl Into<String>, voter: ValAddress, power: i64) -> Self {
        Self {
            denom: denom.into(),
            exchange_rate,
            voter,
            power,
        }
    }

    fn tally_order(&self, other: &Self) -> Ordering {
        self.exchange_rate
            .cmp(&other.exchange_rate)
            .then_with(|| self.voter.cmp(&other.voter))
    }
}

/// All votes for a single denom.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExchangeRateBallot(pub Vec<VoteForTally>);

impl ExchangeRateBallot {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, VoteForTally> {
        self.0.iter()
    }

    pub fn sort(&mut self) {
        self.0.sort_by(VoteForTally::tally_order);
    }

    pub fn is_sorted(&self) -> bool {
        self.0
            .windows(2)
            .all(|w| w[0].tally_order(&w[1]) != Ordering::Greater)
    }

    /// Total voting power behind the ballot.
    pub fn power(&self) -> i64 {
        self.0.iter().map(|v| v.power).sum()
    }

    /// Voter to rate, positive rates only.
    pub fn to_map(&self) -> BTreeMap<ValAddress, Decimal> {
        self.0
            .iter()
            .filter(|v| v.exchange_rate > Decimal::ZERO)
            .map(|v| (v.voter, v.exchange_rate))
            .collect()
    }

    /// Rate of the first vote whose cumulative power reaches half the total.
    pub fn weighted_median(&self) -> OracleResult<Decimal> {
        if !self.is_sorted() {
            return Err(OracleError::BallotNotSorted);
        }

        let total = self.power();
        let mut pivot = 0i64;
        for vote in &self.0 {
            pivot += vote.power;
            if pivot >= total / 2 {
                return Ok(vote.exchange_rate);
            }
        }
        Ok(Decimal::ZERO)
    }

    /// Root mean square distance of every rate from the weighted median.
    ///
    /// A vote whose squared distance overflows is left out of both the sum
    /// and the count.
    pub fn standard_deviation(&self) -> OracleResult<Decimal> {
        if self.0.is_empty() {
            return Ok(Decimal::ZERO);
        }

        let median = self.weighted_median()?;
        let mut sum = Decimal::ZERO;
        let mut count = self.0.len() as i64;
        for vote in &self.0 {
            let squared = vote
                .exchange_rate
                .checked_sub(median)
                .and_then(|d| d.checked_mul(d))
                .and_then(|sq| sum.checked_add(sq));
            match squared {
                Some(next) => sum = next,
                None => count -= 1,
            }
        }

        if count <= 0 {
            return Ok(Decimal::ZERO);
        }
        let variance = decimal::checked_div(sum, Decimal::from(count))?;
        decimal::checked_sqrt(variance)
    }
}

/// A ballot tagged with its denom.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BallotDenom {
    pub denom: String,
    pub ballot: ExchangeRateBallot,
}

/// Turn a denom-keyed map into a denom-ordered list.
pub fn ballot_map_to_slice(votes: BTreeMap<String, ExchangeRateBallot>) -> Vec<BallotDenom> {
    votes
        .into_iter()
        .map(|(denom, ballot)| BallotDenom { denom, ballot })
        .collect()
}

/// Per-validator tally outcome for the current vote period.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Claim {
    pub power: i64,
    pub weight: i64,
    pub mandatory_win_count: i64,
    pub recipient: ValAddress,
}

impl Claim {
    pub fn new(power: i64, weight: i64, mandatory_win_count: i64, recipient: ValAddress) -> Self {
        Self {
            power,
            weight,
            mandatory_win_count,
            recipient,
        }
    }
}

/// Split the claim map into all claims and the reward-eligible subset, both
/// sorted by recipient.
pub fn claim_map_to_slices(
    claims: &BTreeMap<ValAddress, Claim>,
    reward_set: &[ValAddress],
) -> (Vec<Claim>, Vec<Claim>) {
    let eligible: BTreeSet<&ValAddress> = reward_set.iter().collect();
    let all: Vec<Claim> = claims.values().copied().collect();
    let rewarded = all
        .iter()
        .filter(|c| eligible.contains(&c.recipient))
        .copied()
        .collect();
    (all, rewarded)
}
