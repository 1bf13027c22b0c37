//! # Integration Test Flows
//!
//! Whole-block flows through [`crate::harness::OracleNode`]:
//!
//! 1. **Commit-reveal**: prevote in one vote period, reveal in the next,
//!    tally at the period end.
//! 2. **Vote extensions**: signed extensions → PrepareProposal →
//!    ProcessProposal → PreBlock → tally.
//! 3. **Slashing, rewards and plans**: slash-window accounting, reward
//!    payout and height-scheduled governance changes.
//! 4. **Averages**: historic stamps feeding moving averages and USD
//!    conversion.

mod averages;
mod commit_reveal;
mod slashing_and_plans;
mod vote_extensions;
