//! # Quantum-Chain Oracle Test Suite
//!
//! Unified test crate containing:
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── harness.rs        # Multi-validator node fixture
//! ├── benchmarks/       # Tally, averaging and proposal workloads
//! │   └── qc_18_oracle.rs
//! │
//! └── integration/      # End-to-end block flows
//!     ├── averages.rs
//!     ├── commit_reveal.rs
//!     ├── vote_extensions.rs
//!     └── slashing_and_plans.rs
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p qc-tests
//!
//! # By category
//! cargo test -p qc-tests integration::
//!
//! # Benchmarks
//! cargo bench -p qc-tests
//! ```

#![allow(dead_code)]

pub mod benchmarks;
pub mod harness;
pub mod integration;
