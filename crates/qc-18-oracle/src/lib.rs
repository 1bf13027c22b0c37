//! # qc-18-oracle
//!
//! Price oracle subsystem for Quantum-Chain.
//!
//! ## Architecture
//!
//! Validators report exchange rates every block; at the end of every vote
//! period the network agrees on one price per asset through a power-weighted
//! median, pays the validators that voted close to it and counts misses for
//! the rest. Missing too many votes over a slash window gets a validator
//! slashed and jailed.
//!
//! Votes reach the store through two paths:
//!
//! ```text
//! ExtendVote → PrepareProposal (injected tx) → ProcessProposal → PreBlock ─┐
//!                                                                          ├→ votes → EndBlock tally
//! MsgAggregateExchangeRatePrevote → (next period) MsgAggregateExchangeRateVote ─┘
//! ```
//!
//! Consensus prices are stamped into a pruned historic ledger that feeds
//! medians, moving averages and the USD to native conversion.
//!
//! ## Layers
//!
//! - `domain`: pure types and math (ballots, averages, params, keys)
//! - `ports` / `adapters`: store, staking, bank, event bus, price feeder
//! - `keeper`: typed state access and the tally/slash/reward engines
//! - `service`: message server and querier
//! - `abci`: block lifecycle hooks and the vote-extension wire codec
//! - `feeder`: supervised background task for the price feeder
//!
//! ## Usage
//!
//! ```rust,ignore
//! use qc_18_oracle::{OracleApp, OracleAppDependencies, OracleConfig, OracleKeeper};
//!
//! let config = OracleConfig::from_env()?;
//! qc_18_oracle::telemetry::init_tracing(&config)?;
//!
//! let mut app = OracleApp::new(OracleAppDependencies { keeper, config, feeder, verifier });
//! app.pre_block(&finalize_req)?;
//! app.msg_server(height).aggregate_exchange_rate_vote(msg)?;
//! app.end_block(height)?;
//! ```

pub mod abci;
pub mod adapters;
pub mod config;
pub mod domain;
pub mod events;
pub mod feeder;
pub mod keeper;
pub mod metrics;
pub mod ports;
pub mod service;
pub mod telemetry;

// Re-export main types
pub use abci::{OracleApp, OracleAppDependencies};
pub use adapters::{
    InMemoryBankKeeper, InMemoryEventBus, InMemoryKVStore, InMemoryStakingKeeper,
    K256ExtensionVerifier, StaticPriceFeeder,
};
pub use config::{ConfigError, FeederConfig, OracleConfig};
pub use domain::{OracleError, OracleResult, Params};
pub use events::OracleEvent;
pub use feeder::{FeederError, FeederHandle};
pub use keeper::{KeeperDependencies, OracleKeeper};
pub use ports::{
    BankKeeper, EventBus, ExtensionSignatureVerifier, KeyValueStore, PriceFeeder, StakingKeeper,
};
pub use service::{OracleMsgServer, OracleQuerier};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_oracle_config_default() {
        let config = OracleConfig::default();
        assert_eq!(config.vote_extensions_enable_height, 0);
        assert!(!config.feeder.enable);
    }

    #[test]
    fn test_params_default() {
        let params = Params::default();
        assert_eq!(params.vote_period, 10);
        assert!(params.validate().is_ok());
    }
}
