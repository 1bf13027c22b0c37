//! ABCI++ request and response types used by the oracle
//!
//! Only the fields the oracle reads are modelled. `ExtendedCommitInfo` is
//! serializable because the proposer embeds it in the injected transaction.

use crate::domain::ConsAddress;
use serde::{Deserialize, Serialize};

/// How a validator voted in the previous block's commit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockIdFlag {
    Absent,
    Commit,
    Nil,
}

/// Validator identity and power as seen by consensus.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitValidator {
    pub address: ConsAddress,
    pub power: i64,
}

/// One validator's precommit, with its vote extension.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtendedVoteInfo {
    pub validator: CommitValidator,
    pub vote_extension: Vec<u8>,
    pub extension_signature: Vec<u8>,
    pub block_id_flag: BlockIdFlag,
}

/// Extended commit of the previous height.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtendedCommitInfo {
    pub round: i32,
    pub votes: Vec<ExtendedVoteInfo>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestExtendVote {
    pub height: u64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResponseExtendVote {
    pub vote_extension: Vec<u8>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestVerifyVoteExtension {
    pub height: u64,
    pub validator_address: ConsAddress,
    pub vote_extension: Vec<u8>,
}

/// Verdict on a vote extension or a proposal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Status {
    Accept,
    Reject,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResponseVerifyVoteExtension {
    pub status: Status,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestPrepareProposal {
    pub height: u64,
    pub txs: Vec<Vec<u8>>,
    pub local_last_commit: ExtendedCommitInfo,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResponsePrepareProposal {
    pub txs: Vec<Vec<u8>>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestProcessProposal {
    pub height: u64,
    pub txs: Vec<Vec<u8>>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResponseProcessProposal {
    pub status: Status,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestFinalizeBlock {
    pub height: u64,
    pub txs: Vec<Vec<u8>>,
}
