#[cfg(test)]
mod tests {
    use crate::harness::*;
    use qc_18_oracle::domain::{Coin, Decimal};
    use qc_18_oracle::OracleError;
    use rust_decimal_macros::dec;

    fn rates(cheq: Decimal) -> Vec<(&'static str, Decimal)> {
        vec![("CHEQ", cheq), ("USDC", dec!(1)), ("USDT", dec!(1))]
    }

    /// One consensus price per historic stamp period (30 blocks) for three periods.
    fn node_with_three_stamps() -> OracleNode {
        let mut node = OracleNode::new(&[50, 50]);
        let mut next = 1;
        for (stamp_height, cheq) in [(29, dec!(0.4)), (59, dec!(0.5)), (89, dec!(0.6))] {
            node.finalize_empty_blocks(next..=stamp_height - 1).unwrap();
            let r = rates(cheq);
            node.vote_extension_block(stamp_height, &[&r, &r]).unwrap();
            next = stamp_height + 1;
        }
        node
    }

    #[test]
    fn test_averages_follow_historic_stamps() {
        let node = node_with_three_stamps();
        let querier = node.app.querier(89);

        assert_eq!(querier.sma("cheq").unwrap(), dec!(0.5));
        assert!(querier.ema("CHEQ").unwrap() > Decimal::ZERO);
        assert_eq!(node.app.keeper().historic_prices("CHEQ", 10).unwrap().len(), 3);
    }

    #[test]
    fn test_convert_usdc_to_cheq_uses_moving_average() {
        let node = node_with_three_stamps();
        let querier = node.app.querier(89);

        // 2 USD at 0.5 USD/CHEQ
        let converted = querier
            .convert_usdc_to_cheq("2000000000000000000usd", "sma", "", &[])
            .unwrap();
        assert_eq!(converted, Coin::new("ncheq", 4_000_000_000));

        assert!(matches!(
            querier.convert_usdc_to_cheq("2000000000000000000ncheq", "sma", "", &[]),
            Err(OracleError::Conversion(_))
        ));
    }

    #[test]
    fn test_conversion_before_any_stamp_fails() {
        let node = OracleNode::new(&[50, 50]);
        assert!(node
            .app
            .querier(1)
            .convert_usdc_to_cheq("1000000000000000000usd", "ema", "", &[])
            .is_err());
    }
}
