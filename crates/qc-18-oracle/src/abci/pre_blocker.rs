//! PreBlock: persist the votes accepted in ProcessProposal

use super::codec::decode_frame;
use super::types::RequestFinalizeBlock;
use super::OracleApp;
use crate::domain::{InjectedVoteExtensionTx, OracleError, OracleResult, VoteProvenance};
use crate::ports::KeyValueStore;
use tracing::{error, info};

impl<S: KeyValueStore> OracleApp<S> {
    /// Write the injected votes of the block being finalized so they are
    /// visible for the whole block. Returns the number of votes written.
    ///
    /// The block already passed ProcessProposal, so failing to decode its
    /// injected transaction is fatal and propagates.
    pub fn pre_block(&mut self, req: &RequestFinalizeBlock) -> OracleResult<usize> {
        let enabled = self.vote_extensions_enabled(req.height);
        let Some(first) = req.txs.first() else {
            return Ok(0);
        };

        let mut written = 0;
        if enabled {
            let injected: InjectedVoteExtensionTx = decode_frame(first).map_err(|e| {
                error!(subsystem = "oracle", height = req.height, error = %e, "failed to decode injected vote extension tx");
                OracleError::from(e)
            })?;

            let accept_list = self.keeper.params()?.accept_list;
            for mut vote in injected.exchange_rate_votes {
                vote.exchange_rates.retain(|r| accept_list.contains(&r.denom));
                vote.provenance = VoteProvenance::VoteExtension { height: req.height };
                let voter = vote.voter;
                self.keeper.set_aggregate_vote(&voter, &vote)?;
                written += 1;
            }
        }

        info!(
            subsystem = "oracle",
            height = req.height,
            votes = written,
            vote_extensions_enabled = enabled,
            "preblocker executed"
        );
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::super::codec::encode_frame;
    use super::super::test_utils::*;
    use super::*;
    use crate::domain::{AggregateExchangeRateVote, ExchangeRateTuple, ValAddress};
    use rust_decimal_macros::dec;

    fn injected_tx(votes: Vec<AggregateExchangeRateVote>) -> Vec<u8> {
        encode_frame(&InjectedVoteExtensionTx {
            exchange_rate_votes: votes,
            extended_commit_info: Vec::new(),
        })
        .unwrap()
    }

    fn vote(n: u8, rates: Vec<ExchangeRateTuple>) -> AggregateExchangeRateVote {
        AggregateExchangeRateVote {
            exchange_rates: rates,
            voter: ValAddress::new([n; 20]),
            provenance: VoteProvenance::VoteExtension { height: 0 },
        }
    }

    #[test]
    fn test_pre_block_writes_filtered_votes() {
        let mut f = app_fixture(&[10, 20], None);
        let tx = injected_tx(vec![
            vote(
                1,
                vec![
                    ExchangeRateTuple::new("ATOM", dec!(9)),
                    ExchangeRateTuple::new("CHEQ", dec!(0.02)),
                ],
            ),
            vote(2, vec![ExchangeRateTuple::new("CHEQ", dec!(0.021))]),
        ]);

        let written = f
            .app
            .pre_block(&RequestFinalizeBlock {
                height: 12,
                txs: vec![tx, b"user-tx".to_vec()],
            })
            .unwrap();
        assert_eq!(written, 2);

        let stored = f.app.keeper().aggregate_vote(&ValAddress::new([1; 20])).unwrap();
        assert_eq!(stored.exchange_rates, vec![ExchangeRateTuple::new("CHEQ", dec!(0.02))]);
        assert_eq!(stored.provenance, VoteProvenance::VoteExtension { height: 12 });
    }

    #[test]
    fn test_pre_block_without_txs_is_a_no_op() {
        let mut f = app_fixture(&[10], None);
        let written = f
            .app
            .pre_block(&RequestFinalizeBlock {
                height: 12,
                txs: Vec::new(),
            })
            .unwrap();
        assert_eq!(written, 0);
    }

    #[test]
    fn test_pre_block_propagates_decode_failure() {
        let mut f = app_fixture(&[10], None);
        let err = f
            .app
            .pre_block(&RequestFinalizeBlock {
                height: 12,
                txs: vec![vec![1, 2]],
            })
            .unwrap_err();
        assert!(matches!(err, OracleError::Codec(_)));
    }

    #[test]
    fn test_pre_block_ignores_txs_when_disabled() {
        let mut f = app_fixture(&[10], None);
        f.app.config.vote_extensions_enable_height = 0;
        let written = f
            .app
            .pre_block(&RequestFinalizeBlock {
                height: 12,
                txs: vec![vec![1, 2]],
            })
            .unwrap();
        assert_eq!(written, 0);
        assert!(f.app.keeper().aggregate_votes().unwrap().is_empty());
    }
}
