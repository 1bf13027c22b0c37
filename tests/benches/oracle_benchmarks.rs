//! # Quantum-Chain Oracle Benchmarks
//!
//! | Path | Runs | Concern |
//! |------|------|---------|
//! | Ballot tally | once per denom per vote period | weighted median over all voters |
//! | Moving averages | once per averaging window | SMA, EMA and WMA over stamps |
//! | ProcessProposal | every proposal | signature check of every extension |

use criterion::{criterion_group, criterion_main};
use qc_tests::benchmarks::qc_18_oracle::{
    brutal_ballot_tally, brutal_moving_averages, brutal_proposal_verification,
};

criterion_group!(
    benches,
    brutal_ballot_tally,
    brutal_moving_averages,
    brutal_proposal_verification,
);

criterion_main!(benches);
