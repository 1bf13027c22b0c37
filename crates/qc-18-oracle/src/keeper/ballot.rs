//! Ballot aggregation

use super::OracleKeeper;
use crate::domain::{
    ballot_map_to_slice, BallotDenom, Claim, ExchangeRateBallot, OracleResult, ValAddress,
    VoteForTally,
};
use crate::ports::KeyValueStore;
use std::collections::BTreeMap;

impl<S: KeyValueStore> OracleKeeper<S> {
    /// Group stored votes by denom into sorted ballots.
    ///
    /// Only voters present in `claims` are counted, each with its claim power.
    /// Ballots come back in denom order.
    pub fn organize_ballot_by_denom(
        &self,
        claims: &BTreeMap<ValAddress, Claim>,
    ) -> OracleResult<Vec<BallotDenom>> {
        let mut votes: BTreeMap<String, ExchangeRateBallot> = BTreeMap::new();

        for vote in self.aggregate_votes()? {
            let Some(claim) = claims.get(&vote.voter) else {
                continue;
            };
            for tuple in &vote.exchange_rates {
                votes.entry(tuple.denom.clone()).or_default().0.push(VoteForTally::new(
                    tuple.exchange_rate,
                    tuple.denom.clone(),
                    vote.voter,
                    claim.power,
                ));
            }
        }

        for ballot in votes.values_mut() {
            ballot.sort();
        }
        Ok(ballot_map_to_slice(votes))
    }

    /// Drop expired prevotes and every vote.
    ///
    /// A prevote survives while `height <= submit_block + vote_period`, so a
    /// prevote from the closing period can still be revealed in the next one.
    pub fn clear_ballots(&mut self, height: u64, vote_period: u64) -> OracleResult<()> {
        for prevote in self.aggregate_prevotes()? {
            if height > prevote.submit_block + vote_period {
                self.delete_aggregate_prevote(&prevote.voter)?;
            }
        }
        for vote in self.aggregate_votes()? {
            self.delete_aggregate_vote(&vote.voter)?;
        }
        Ok(())
    }
}
