#[cfg(test)]
mod tests {
    use crate::harness::*;
    use qc_18_oracle::abci::{
        decode_frame, encode_frame, RequestExtendVote, RequestPrepareProposal,
        RequestProcessProposal, RequestVerifyVoteExtension, Status,
    };
    use qc_18_oracle::domain::{
        Decimal, ExchangeRateTuple, InjectedVoteExtensionTx, OracleVoteExtension,
    };
    use qc_18_oracle::OracleError;
    use rust_decimal_macros::dec;

    fn full_rates(cheq: Decimal) -> Vec<(&'static str, Decimal)> {
        vec![("CHEQ", cheq), ("USDC", dec!(0.9999)), ("USDT", dec!(1.0001))]
    }

    /// Extensions of height 8 are injected at 9 and tallied at the end of 9.
    #[test]
    fn test_vote_extensions_reach_the_tally() {
        let mut node = OracleNode::new(&[10, 20, 30]);
        node.finalize_empty_blocks(1..=8).unwrap();

        let r1 = full_rates(dec!(0.020));
        let r2 = full_rates(dec!(0.021));
        let r3 = full_rates(dec!(0.0212));
        node.vote_extension_block(9, &[&r1, &r2, &r3]).unwrap();

        // total power 60, half 30: the 0.021 vote reaches it
        assert_eq!(node.app.keeper().exchange_rate("CHEQ").unwrap(), dec!(0.021));
        assert_eq!(node.app.keeper().exchange_rate("USDT").unwrap(), dec!(1.0001));
        assert!(node.app.keeper().aggregate_votes().unwrap().is_empty());
    }

    #[test]
    fn test_validator_with_empty_extension_counts_misses() {
        let mut node = OracleNode::new(&[30, 30, 40]);
        node.finalize_empty_blocks(1..=8).unwrap();

        let rates = full_rates(dec!(0.02));
        node.vote_extension_block(9, &[&rates, &rates, &[]]).unwrap();

        let keeper = node.app.keeper();
        assert_eq!(keeper.exchange_rate("CHEQ").unwrap(), dec!(0.02));
        // the empty extension misses every mandatory denom
        assert_eq!(keeper.miss_counter(&node.validator(1).operator).unwrap(), 0);
        assert_eq!(keeper.miss_counter(&node.validator(3).operator).unwrap(), 3);
    }

    #[test]
    fn test_unaccepted_denoms_never_reach_the_store() {
        let mut node = OracleNode::new(&[50, 50]);
        let rates = vec![("ATOM", dec!(9.5)), ("CHEQ", dec!(0.02))];
        let commit = node.extended_commit(4, &[&rates, &rates]);
        let prepared = node
            .app
            .prepare_proposal(&RequestPrepareProposal {
                height: 5,
                txs: Vec::new(),
                local_last_commit: commit,
            })
            .unwrap();
        node.app
            .pre_block(&qc_18_oracle::abci::RequestFinalizeBlock {
                height: 5,
                txs: prepared.txs,
            })
            .unwrap();

        let vote = node.app.keeper().aggregate_vote(&node.validator(1).operator).unwrap();
        assert_eq!(vote.exchange_rates, vec![ExchangeRateTuple::new("CHEQ", dec!(0.02))]);
    }

    #[test]
    fn test_proposal_with_forged_votes_is_rejected() {
        let node = OracleNode::new(&[10, 20, 30]);
        let rates = full_rates(dec!(0.02));
        let commit = node.extended_commit(9, &[&rates, &rates, &rates]);
        let prepared = node
            .app
            .prepare_proposal(&RequestPrepareProposal {
                height: 10,
                txs: vec![b"bank-send".to_vec()],
                local_last_commit: commit,
            })
            .unwrap();

        let mut injected: InjectedVoteExtensionTx = decode_frame(&prepared.txs[0]).unwrap();
        injected.exchange_rate_votes[2].exchange_rates[0].exchange_rate = dec!(2.0);
        let mut txs = prepared.txs.clone();
        txs[0] = encode_frame(&injected).unwrap();

        let req = RequestProcessProposal { height: 10, txs };
        assert_eq!(node.app.process_proposal(&req).status, Status::Reject);
        assert_eq!(node.app.check_proposal(&req), Err(OracleError::NonEqualInjVotesRates));
    }

    #[test]
    fn test_proposal_missing_supermajority_signatures_fails() {
        let node = OracleNode::new(&[10, 20, 30]);
        let rates = full_rates(dec!(0.02));
        let mut commit = node.extended_commit(9, &[&rates, &rates, &rates]);
        // the 30-power signature is for another height
        commit.votes[2] = node.validator(3).extended_vote(7, &rates);

        let result = node.app.prepare_proposal(&RequestPrepareProposal {
            height: 10,
            txs: Vec::new(),
            local_last_commit: commit,
        });
        assert!(matches!(result, Err(OracleError::InvalidVoteExtension(_))));
    }

    #[tokio::test]
    async fn test_feeder_prices_flow_into_extensions() {
        let mut node = OracleNode::with_options(NodeOptions {
            runtime: Some(tokio::runtime::Handle::current()),
            ..NodeOptions::default()
        });
        node.feeder.set_prices(vec![
            ExchangeRateTuple::new("CHEQ", dec!(0.0199)),
            ExchangeRateTuple::new("DOGE", dec!(0.1)),
        ]);

        node.finalize_block(1, Vec::new()).unwrap();
        assert!(node.app.feeder().unwrap().is_started());

        let extension = node
            .app
            .extend_vote(&RequestExtendVote { height: 2 })
            .unwrap()
            .vote_extension;
        let decoded: OracleVoteExtension = decode_frame(&extension).unwrap();
        assert_eq!(decoded.exchange_rates, vec![ExchangeRateTuple::new("CHEQ", dec!(0.0199))]);

        let verdict = node.app.verify_vote_extension(&RequestVerifyVoteExtension {
            height: 2,
            validator_address: node.validator(1).cons,
            vote_extension: extension.clone(),
        });
        assert_eq!(verdict.status, Status::Accept);

        let stale = node.app.verify_vote_extension(&RequestVerifyVoteExtension {
            height: 3,
            validator_address: node.validator(1).cons,
            vote_extension: extension,
        });
        assert_eq!(stale.status, Status::Reject);

        node.app.feeder().unwrap().stop().await.unwrap();
        assert_eq!(node.feeder.start_count(), 1);
    }
}
