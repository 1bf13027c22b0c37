//! ABCI++ integration
//!
//! [`OracleApp`] owns the keeper and drives it through the block lifecycle:
//!
//! ```text
//! ExtendVote ──► VerifyVoteExtension ──► PrepareProposal ──► ProcessProposal
//!                                                                  │
//!                         EndBlock ◄── (messages) ◄── PreBlock ◄───┘
//! ```
//!
//! Vote extensions of height `h - 1` reach the store at height `h`: the
//! proposer decodes them from the extended commit, sorts them by voter and
//! prepends them as an injected transaction; every validator re-derives the
//! same list in ProcessProposal and rejects the block on any difference;
//! PreBlock writes the accepted votes.
//!
//! The phases are split across the submodules:
//!
//! - `vote_extension`: ExtendVote, VerifyVoteExtension
//! - `proposal`: PrepareProposal, ProcessProposal, extension signatures
//! - `pre_blocker`: PreBlock
//! - `end_blocker`: plan execution, feeder, tally, slashing, pruning

mod codec;
mod end_blocker;
mod pre_blocker;
mod proposal;
mod types;
mod vote_extension;

pub use codec::*;
pub use end_blocker::{calc_prices, tally};
pub use proposal::{generate_exchange_rate_votes, validate_vote_extensions, verify_exchange_rate_votes};
pub use types::*;

use crate::config::OracleConfig;
use crate::feeder::FeederHandle;
use crate::keeper::OracleKeeper;
use crate::ports::{ExtensionSignatureVerifier, KeyValueStore};
use crate::service::{OracleMsgServer, OracleQuerier};
use std::sync::Arc;

/// Dependencies for OracleApp
pub struct OracleAppDependencies<S: KeyValueStore> {
    pub keeper: OracleKeeper<S>,
    pub config: OracleConfig,
    /// `None` runs the node without an in-process feeder; its vote
    /// extensions are then empty.
    pub feeder: Option<FeederHandle>,
    pub verifier: Arc<dyn ExtensionSignatureVerifier>,
}

/// The oracle module as seen by the consensus engine.
pub struct OracleApp<S: KeyValueStore> {
    keeper: OracleKeeper<S>,
    config: OracleConfig,
    feeder: Option<FeederHandle>,
    verifier: Arc<dyn ExtensionSignatureVerifier>,
}

impl<S: KeyValueStore> OracleApp<S> {
    pub fn new(deps: OracleAppDependencies<S>) -> Self {
        Self {
            keeper: deps.keeper,
            config: deps.config,
            feeder: deps.feeder,
            verifier: deps.verifier,
        }
    }

    pub fn keeper(&self) -> &OracleKeeper<S> {
        &self.keeper
    }

    pub fn keeper_mut(&mut self) -> &mut OracleKeeper<S> {
        &mut self.keeper
    }

    pub fn config(&self) -> &OracleConfig {
        &self.config
    }

    pub fn feeder(&self) -> Option<&FeederHandle> {
        self.feeder.as_ref()
    }

    /// Message server for transactions in the block at `height`.
    pub fn msg_server(&mut self, height: u64) -> OracleMsgServer<'_, S> {
        OracleMsgServer::new(&mut self.keeper, height)
    }

    /// Querier over the state at `height`.
    pub fn querier(&self, height: u64) -> OracleQuerier<'_, S> {
        OracleQuerier::new(&self.keeper, height)
    }

    pub fn vote_extensions_enabled(&self, height: u64) -> bool {
        self.config.vote_extensions_enabled(height)
    }
}
