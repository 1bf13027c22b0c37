#[cfg(test)]
mod tests {
    use crate::harness::*;
    use qc_18_oracle::domain::{
        AccAddress, Coin, Decimal, MsgGovCancelUpdateParamPlan, MsgGovUpdateParams,
        ParamUpdatePlan, Params, Proposal,
    };
    use qc_18_oracle::{OracleError, OracleEvent};
    use rust_decimal_macros::dec;

    fn full_rates() -> Vec<(&'static str, Decimal)> {
        vec![("CHEQ", dec!(0.02)), ("USDC", dec!(1)), ("USDT", dec!(1))]
    }

    fn proposal() -> Proposal {
        Proposal {
            title: "Raise vote threshold".into(),
            description: "Require two thirds of bonded power per ballot".into(),
        }
    }

    // =========================================================================
    // Slashing
    // =========================================================================

    /// Two vote periods per slash window; validator 3 never reports.
    #[test]
    fn test_silent_validator_is_slashed_and_jailed_at_window_end() {
        let params = Params {
            slash_window: 20,
            ..Params::default()
        };
        let mut node = OracleNode::with_options(NodeOptions {
            powers: vec![40, 40, 20],
            params,
            ..NodeOptions::default()
        });
        let rates = full_rates();

        node.finalize_empty_blocks(1..=8).unwrap();
        node.vote_extension_block(9, &[&rates, &rates, &[]]).unwrap();
        assert_eq!(node.app.keeper().miss_counter(&node.validator(3).operator).unwrap(), 3);

        node.finalize_empty_blocks(10..=18).unwrap();
        node.vote_extension_block(19, &[&rates, &rates, &[]]).unwrap();

        let silent = node.validator(3);
        assert!(node.staking.is_jailed(&silent.operator));
        let slashes = node.staking.slashes();
        assert_eq!(slashes.len(), 1);
        assert_eq!(slashes[0].cons, silent.cons);
        assert_eq!(slashes[0].fraction, dec!(0.0001));

        assert!(!node.staking.is_jailed(&node.validator(1).operator));
        assert!(node.app.keeper().miss_counters().unwrap().is_empty());
        assert!(node
            .events
            .get_events()
            .iter()
            .any(|e| matches!(e, OracleEvent::ValidatorSlashed { validator, .. } if *validator == silent.operator)));
    }

    #[test]
    fn test_slashing_disabled_only_resets_counters() {
        let params = Params {
            slash_window: 20,
            slashing_enabled: false,
            ..Params::default()
        };
        let mut node = OracleNode::with_options(NodeOptions {
            powers: vec![40, 40, 20],
            params,
            ..NodeOptions::default()
        });
        let rates = full_rates();

        node.finalize_empty_blocks(1..=8).unwrap();
        node.vote_extension_block(9, &[&rates, &rates, &[]]).unwrap();
        node.finalize_empty_blocks(10..=19).unwrap();

        assert!(node.staking.slashes().is_empty());
        assert!(node.app.keeper().miss_counters().unwrap().is_empty());
    }

    // =========================================================================
    // Rewards
    // =========================================================================

    #[test]
    fn test_winners_share_the_period_reward() {
        let params = Params {
            reward_distribution_window: 100,
            ..Params::default()
        };
        let mut node = OracleNode::with_options(NodeOptions {
            powers: vec![50, 50],
            params,
            ..NodeOptions::default()
        });
        node.bank.fund_module(Coin::new("ncheq", 1_000_000));
        node.app.keeper_mut().set_validator_reward_set().unwrap();
        let rates = full_rates();

        node.finalize_empty_blocks(1..=8).unwrap();
        node.vote_extension_block(9, &[&rates, &rates]).unwrap();

        // vote_period / window = 0.1 of the pool, split evenly
        assert_eq!(node.bank.allocated_to(&node.validator(1).operator, "ncheq"), 50_000);
        assert_eq!(node.bank.allocated_to(&node.validator(2).operator, "ncheq"), 50_000);
        assert_eq!(node.bank.distribution_balance("ncheq"), 100_000);
    }

    #[test]
    fn test_no_reward_set_means_no_payout() {
        let mut node = OracleNode::new(&[50, 50]);
        node.bank.fund_module(Coin::new("ncheq", 1_000_000));
        let rates = full_rates();

        node.finalize_empty_blocks(1..=8).unwrap();
        node.vote_extension_block(9, &[&rates, &rates]).unwrap();

        assert_eq!(node.bank.distribution_balance("ncheq"), 0);
        assert_eq!(node.app.keeper().exchange_rate("CHEQ").unwrap(), dec!(0.02));
    }

    // =========================================================================
    // Param update plans
    // =========================================================================

    #[test]
    fn test_scheduled_plan_applies_at_its_height() {
        let mut node = OracleNode::new(&[10, 20, 30]);
        let mut changes = Params::default();
        changes.vote_threshold = dec!(0.67);

        node.app
            .msg_server(3)
            .gov_update_params(&MsgGovUpdateParams {
                authority: AUTHORITY,
                proposal: proposal(),
                plan: ParamUpdatePlan::new(vec!["VoteThreshold".into()], 15, changes),
            })
            .unwrap();

        node.finalize_empty_blocks(3..=14).unwrap();
        assert_eq!(node.app.keeper().params().unwrap().vote_threshold, dec!(0.50));

        node.finalize_block(15, Vec::new()).unwrap();
        assert_eq!(node.app.keeper().params().unwrap().vote_threshold, dec!(0.67));
        assert!(node.app.keeper().param_update_plans().unwrap().is_empty());
        assert!(node
            .events
            .get_events()
            .contains(&OracleEvent::ParamUpdate { notify_price_feeder: true }));
    }

    #[test]
    fn test_plan_rules_for_authority_and_height() {
        let mut node = OracleNode::new(&[10]);
        let plan = ParamUpdatePlan::new(vec!["SlashFraction".into()], 20, Params::default());

        let forged = MsgGovUpdateParams {
            authority: AccAddress::new([0x01; 20]),
            proposal: proposal(),
            plan: plan.clone(),
        };
        assert!(matches!(
            node.app.msg_server(3).gov_update_params(&forged),
            Err(OracleError::NoGovAuthority { .. })
        ));

        let late = MsgGovUpdateParams {
            authority: AUTHORITY,
            proposal: proposal(),
            plan,
        };
        let err = node.app.msg_server(20).gov_update_params(&late).unwrap_err();
        assert!(err.to_string().contains("scheduled in the past"));
    }

    #[test]
    fn test_cancelled_plan_never_executes() {
        let mut node = OracleNode::new(&[10]);
        let mut changes = Params::default();
        changes.vote_threshold = dec!(0.9);

        node.app
            .msg_server(1)
            .gov_update_params(&MsgGovUpdateParams {
                authority: AUTHORITY,
                proposal: proposal(),
                plan: ParamUpdatePlan::new(vec!["VoteThreshold".into()], 5, changes),
            })
            .unwrap();
        node.app
            .msg_server(2)
            .gov_cancel_update_param_plan(&MsgGovCancelUpdateParamPlan {
                authority: AUTHORITY,
                proposal: proposal(),
                height: 5,
            })
            .unwrap();

        node.finalize_empty_blocks(2..=6).unwrap();
        assert_eq!(node.app.keeper().params().unwrap().vote_threshold, dec!(0.50));
    }
}
