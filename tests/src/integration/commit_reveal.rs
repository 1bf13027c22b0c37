#[cfg(test)]
mod tests {
    use crate::harness::*;
    use qc_18_oracle::domain::{
        AccAddress, MsgAggregateExchangeRatePrevote, MsgAggregateExchangeRateVote,
        MsgDelegateFeedConsent, VoteHash, VoteProvenance,
    };
    use qc_18_oracle::{OracleError, OracleEvent};
    use rust_decimal_macros::dec;

    const RATES: &str = "CHEQ:0.0213,USDT:1.0002,USDC:0.9998";

    fn prevote(node: &mut OracleNode, n: usize, height: u64, rates: &str) -> Result<(), OracleError> {
        let v = node.validator(n);
        let msg = MsgAggregateExchangeRatePrevote {
            hash: VoteHash::aggregate(&salt(n as u8), rates, &v.operator).to_string(),
            feeder: v.account(),
            validator: v.operator,
        };
        node.app.msg_server(height).aggregate_exchange_rate_prevote(&msg)
    }

    fn reveal(node: &mut OracleNode, n: usize, height: u64, rates: &str) -> Result<(), OracleError> {
        let v = node.validator(n);
        let msg = MsgAggregateExchangeRateVote {
            salt: salt(n as u8),
            exchange_rates: rates.to_string(),
            feeder: v.account(),
            validator: v.operator,
        };
        node.app.msg_server(height).aggregate_exchange_rate_vote(&msg)
    }

    fn commit_reveal_node() -> OracleNode {
        OracleNode::with_options(NodeOptions {
            powers: vec![30, 30, 40],
            vote_extensions_enable_height: 0,
            ..NodeOptions::default()
        })
    }

    /// Prevotes in period 0, reveals in period 1, price at the end of period 1.
    #[test]
    fn test_commit_reveal_sets_consensus_price() {
        let mut node = commit_reveal_node();

        node.finalize_empty_blocks(1..=4).unwrap();
        for n in 1..=3 {
            prevote(&mut node, n, 5, RATES).unwrap();
        }
        node.finalize_empty_blocks(5..=11).unwrap();

        for n in 1..=3 {
            reveal(&mut node, n, 12, RATES).unwrap();
        }
        let stored = node.app.keeper().aggregate_vote(&node.validator(1).operator).unwrap();
        assert_eq!(
            stored.provenance,
            VoteProvenance::CommitReveal {
                prevote_block: 5,
                revealed_at: 12
            }
        );
        assert!(node.app.keeper().aggregate_prevotes().unwrap().is_empty());

        node.finalize_empty_blocks(12..=19).unwrap();

        let querier = node.app.querier(19);
        let rates = querier.exchange_rates(None).unwrap();
        assert_eq!(rates.len(), 3);
        assert_eq!(node.app.keeper().exchange_rate("CHEQ").unwrap(), dec!(0.0213));
        // only the empty first period counted as misses
        for n in 1..=3 {
            assert_eq!(querier.miss_counter(&node.validator(n).operator).unwrap(), 3);
        }
        assert!(node
            .events
            .get_events()
            .iter()
            .any(|e| matches!(e, OracleEvent::SetFxRate { denom, .. } if denom == "CHEQ")));
    }

    #[test]
    fn test_reveal_in_prevote_period_is_rejected() {
        let mut node = commit_reveal_node();
        prevote(&mut node, 1, 3, RATES).unwrap();

        assert_eq!(reveal(&mut node, 1, 7, RATES), Err(OracleError::RevealPeriodMissMatch));
        // two periods later is just as wrong
        assert_eq!(reveal(&mut node, 1, 25, RATES), Err(OracleError::RevealPeriodMissMatch));
    }

    #[test]
    fn test_reveal_with_different_rates_fails_hash_check() {
        let mut node = commit_reveal_node();
        prevote(&mut node, 1, 3, RATES).unwrap();

        let err = reveal(&mut node, 1, 13, "CHEQ:0.5").unwrap_err();
        assert!(matches!(err, OracleError::VerificationFailed { .. }));
        // the prevote is kept for a correct reveal
        assert!(reveal(&mut node, 1, 14, RATES).is_ok());
    }

    #[test]
    fn test_second_prevote_in_period_is_rejected() {
        let mut node = commit_reveal_node();
        prevote(&mut node, 2, 3, RATES).unwrap();
        assert_eq!(prevote(&mut node, 2, 4, RATES), Err(OracleError::ExistingPrevote));
    }

    #[test]
    fn test_delegated_feeder_votes_for_validator() {
        let mut node = commit_reveal_node();
        let operator = node.validator(1).operator;
        let delegate = AccAddress::new([0x42; 20]);

        node.app
            .msg_server(2)
            .delegate_feed_consent(&MsgDelegateFeedConsent { operator, delegate })
            .unwrap();

        let msg = MsgAggregateExchangeRatePrevote {
            hash: VoteHash::aggregate(&salt(1), RATES, &operator).to_string(),
            feeder: delegate,
            validator: operator,
        };
        node.app.msg_server(3).aggregate_exchange_rate_prevote(&msg).unwrap();

        // the validator's own account lost its feeding right
        let own = MsgAggregateExchangeRateVote {
            salt: salt(1),
            exchange_rates: RATES.to_string(),
            feeder: node.validator(1).account(),
            validator: operator,
        };
        assert!(matches!(
            node.app.msg_server(13).aggregate_exchange_rate_vote(&own),
            Err(OracleError::NoVotingPermission { .. })
        ));
        assert_eq!(node.app.querier(13).feeder_delegation(&operator).unwrap(), delegate);
    }
}
