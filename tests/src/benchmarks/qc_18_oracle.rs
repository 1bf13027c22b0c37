//! # QC-18 Oracle Benchmarks
//!
//! Hot paths of a vote-period close:
//! - Ballot tally: sort, weighted median and reward-band claims per denom
//! - Moving averages over the averaging window
//! - ProcessProposal re-verification of every signed vote extension
//!
//! Brutal Conditions:
//! - Ballots with 10,000 voters
//! - Widely scattered rates (one in ten far outside the band)
//! - Full validator set signing extensions for all mandatory denoms

use crate::harness::OracleNode;
use criterion::{black_box, BenchmarkId, Criterion, Throughput};
use qc_18_oracle::abci::{tally, RequestPrepareProposal, RequestProcessProposal};
use qc_18_oracle::domain::{
    exponential_moving_average, simple_moving_average, weighted_moving_average, wma_weights,
    Claim, Decimal, ExchangeRateBallot, ValAddress, VoteForTally, WmaStrategy,
};
use rand::Rng;
use rust_decimal_macros::dec;
use std::collections::BTreeMap;
use std::time::Duration;

fn voter(i: u32) -> ValAddress {
    let mut bytes = [0u8; 20];
    bytes[..4].copy_from_slice(&i.to_be_bytes());
    ValAddress::new(bytes)
}

/// `n` votes around 0.02 with every tenth voter far off.
fn scattered_ballot(n: u32) -> ExchangeRateBallot {
    let mut rng = rand::thread_rng();
    let votes = (0..n)
        .map(|i| {
            let rate = if i % 10 == 0 {
                Decimal::new(rng.gen_range(1..1_000_000), 4)
            } else {
                Decimal::new(rng.gen_range(19_500..20_500), 6)
            };
            VoteForTally::new(rate, "CHEQ", voter(i), rng.gen_range(1..1_000))
        })
        .collect();
    ExchangeRateBallot(votes)
}

fn claims_for(ballot: &ExchangeRateBallot) -> BTreeMap<ValAddress, Claim> {
    ballot
        .iter()
        .map(|v| (v.voter, Claim::new(v.power, 0, 0, v.voter)))
        .collect()
}

pub fn brutal_ballot_tally(c: &mut Criterion) {
    let mut group = c.benchmark_group("qc-18-ballot-tally");
    group.measurement_time(Duration::from_secs(10));

    for size in [100u32, 1_000, 10_000] {
        let ballot = scattered_ballot(size);
        group.throughput(Throughput::Elements(size as u64));

        group.bench_with_input(BenchmarkId::new("sort_and_median", size), &ballot, |b, ballot| {
            b.iter(|| {
                let mut sorted = ballot.clone();
                sorted.sort();
                black_box(sorted.weighted_median())
            })
        });

        let mut sorted = ballot.clone();
        sorted.sort();
        group.bench_with_input(BenchmarkId::new("tally", size), &sorted, |b, sorted| {
            b.iter(|| {
                let mut claims = claims_for(sorted);
                black_box(tally(sorted, dec!(0.02), &mut claims, true))
            })
        });
    }

    group.finish();
}

pub fn brutal_moving_averages(c: &mut Criterion) {
    let mut group = c.benchmark_group("qc-18-moving-averages");
    let mut rng = rand::thread_rng();

    for window in [3usize, 30, 300] {
        let samples: Vec<Decimal> = (0..window)
            .map(|_| Decimal::new(rng.gen_range(15_000..25_000), 6))
            .collect();
        group.throughput(Throughput::Elements(window as u64));

        group.bench_with_input(BenchmarkId::new("sma", window), &samples, |b, s| {
            b.iter(|| black_box(simple_moving_average(s)))
        });
        group.bench_with_input(BenchmarkId::new("ema_seeded", window), &samples, |b, s| {
            b.iter(|| black_box(exponential_moving_average(None, s, window as u64)))
        });
        group.bench_with_input(BenchmarkId::new("wma_balanced", window), &samples, |b, s| {
            b.iter(|| {
                let weights = wma_weights(WmaStrategy::Balanced, s.len(), &[]);
                black_box(weights.and_then(|w| weighted_moving_average(s, &w)))
            })
        });
    }

    group.finish();
}

pub fn brutal_proposal_verification(c: &mut Criterion) {
    let mut group = c.benchmark_group("qc-18-process-proposal");
    group.measurement_time(Duration::from_secs(10));

    for validators in [10usize, 50, 150] {
        let node = OracleNode::new(&vec![100; validators]);
        let rates = vec![
            ("CHEQ", dec!(0.02)),
            ("USDC", dec!(0.9999)),
            ("USDT", dec!(1.0001)),
        ];
        let per_validator: Vec<&[(&str, Decimal)]> = (0..validators).map(|_| rates.as_slice()).collect();
        let commit = node.extended_commit(9, &per_validator);
        let Ok(prepared) = node.app.prepare_proposal(&RequestPrepareProposal {
            height: 10,
            txs: Vec::new(),
            local_last_commit: commit,
        }) else {
            continue;
        };
        let req = RequestProcessProposal {
            height: 10,
            txs: prepared.txs,
        };

        group.throughput(Throughput::Elements(validators as u64));
        group.bench_with_input(BenchmarkId::new("check_proposal", validators), &req, |b, req| {
            b.iter(|| black_box(node.app.check_proposal(req)))
        });
    }

    group.finish();
}

pub fn register_benchmarks(c: &mut Criterion) {
    brutal_ballot_tally(c);
    brutal_moving_averages(c);
    brutal_proposal_verification(c);
}
