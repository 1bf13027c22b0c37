//! # Oracle Benchmarks
//!
//! Stress benchmarks for the per-block oracle paths.

pub mod qc_18_oracle;
