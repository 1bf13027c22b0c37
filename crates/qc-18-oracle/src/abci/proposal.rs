//! PrepareProposal and ProcessProposal
//!
//! Both sides derive the vote list with [`generate_exchange_rate_votes`], a
//! pure function of the extended commit and the validator set. The proposer
//! prepends it as an [`InjectedVoteExtensionTx`]; every other validator
//! re-derives it and rejects the block unless the two lists match pairwise.

use super::codec::{decode_frame, encode_frame, vote_extension_sign_bytes};
use super::types::{
    BlockIdFlag, ExtendedCommitInfo, RequestPrepareProposal, RequestProcessProposal,
    ResponsePrepareProposal, ResponseProcessProposal, Status,
};
use super::OracleApp;
use crate::domain::{
    AggregateExchangeRateVote, InjectedVoteExtensionTx, OracleError, OracleResult,
    OracleVoteExtension, VoteProvenance,
};
use crate::ports::{ExtensionSignatureVerifier, KeyValueStore, StakingKeeper};
use tracing::{error, info};

fn invalid(msg: String) -> OracleError {
    OracleError::InvalidVoteExtension(msg)
}

/// Check the extension signatures of the commit preceding `height`.
///
/// With extensions enabled, every committed vote must carry a signature over
/// its extension that verifies with the validator's consensus key, and the
/// signed power must exceed two thirds of the commit's total power. With
/// extensions disabled, no vote may carry an extension or a signature.
pub fn validate_vote_extensions(
    staking: &dyn StakingKeeper,
    verifier: &dyn ExtensionSignatureVerifier,
    chain_id: &str,
    extensions_enabled: bool,
    height: u64,
    commit: &ExtendedCommitInfo,
) -> OracleResult<()> {
    if !extensions_enabled {
        for vote in &commit.votes {
            if !vote.vote_extension.is_empty() || !vote.extension_signature.is_empty() {
                return Err(invalid(format!(
                    "vote extensions disabled; received non-empty vote extension at height {height}"
                )));
            }
        }
        return Ok(());
    }

    let commit_height = height
        .checked_sub(1)
        .ok_or_else(|| invalid("no commit precedes height 0".to_string()))?;

    let mut total_power: i128 = 0;
    let mut signed_power: i128 = 0;
    for vote in &commit.votes {
        total_power += i128::from(vote.validator.power);
        if vote.block_id_flag != BlockIdFlag::Commit {
            continue;
        }

        let address = vote.validator.address;
        if vote.extension_signature.is_empty() {
            return Err(invalid(format!(
                "vote extensions enabled; received empty vote extension signature at height {height}"
            )));
        }

        let validator = staking
            .validator_by_cons_addr(&address)
            .map_err(OracleError::Staking)?
            .ok_or_else(|| OracleError::ValidatorNotFound(address.to_string()))?;

        let sign_bytes =
            vote_extension_sign_bytes(commit_height, commit.round, chain_id, &vote.vote_extension)?;
        if !verifier.verify(
            &validator.consensus_pubkey,
            &sign_bytes,
            &vote.extension_signature,
        ) {
            return Err(invalid(format!(
                "failed to verify validator {address} vote extension signature"
            )));
        }
        signed_power += i128::from(vote.validator.power);
    }

    if total_power <= 0 {
        return Err(invalid(format!(
            "total voting power must be positive, got: {total_power}"
        )));
    }
    let required = total_power * 2 / 3 + 1;
    if signed_power < required {
        return Err(invalid(format!(
            "insufficient cumulative voting power received to verify vote extensions; got: {signed_power}, expected: >={required}"
        )));
    }
    Ok(())
}

/// Votes carried by the committed extensions, one per committed validator,
/// sorted by voter.
///
/// An empty extension yields a vote without rates.
pub fn generate_exchange_rate_votes(
    staking: &dyn StakingKeeper,
    height: u64,
    commit: &ExtendedCommitInfo,
) -> OracleResult<Vec<AggregateExchangeRateVote>> {
    let mut votes = Vec::new();
    for vote in &commit.votes {
        if vote.block_id_flag != BlockIdFlag::Commit {
            continue;
        }

        let exchange_rates = if vote.vote_extension.is_empty() {
            Vec::new()
        } else {
            decode_frame::<OracleVoteExtension>(&vote.vote_extension)
                .map_err(|e| invalid(format!("failed to decode vote extension: {e}")))?
                .exchange_rates
        };

        let validator = staking
            .validator_by_cons_addr(&vote.validator.address)
            .map_err(OracleError::Staking)?
            .ok_or_else(|| OracleError::ValidatorNotFound(vote.validator.address.to_string()))?;

        votes.push(AggregateExchangeRateVote {
            exchange_rates,
            voter: validator.operator,
            provenance: VoteProvenance::VoteExtension { height },
        });
    }

    votes.sort_by(|a, b| a.voter.cmp(&b.voter));
    Ok(votes)
}

/// Require the injected votes to equal the generated ones, position by position.
pub fn verify_exchange_rate_votes(
    injected: &[AggregateExchangeRateVote],
    generated: &[AggregateExchangeRateVote],
) -> OracleResult<()> {
    if injected.len() != generated.len() {
        return Err(OracleError::NonEqualInjVotesLen);
    }
    if injected
        .iter()
        .zip(generated)
        .any(|(i, g)| !i.same_ballot_as(g))
    {
        return Err(OracleError::NonEqualInjVotesRates);
    }
    Ok(())
}

fn rejection_reason(e: &OracleError) -> &'static str {
    match e {
        OracleError::NoCommitInfo => "no_commit_info",
        OracleError::NonEqualInjVotesLen => "votes_len_mismatch",
        OracleError::NonEqualInjVotesRates => "votes_mismatch",
        OracleError::InvalidVoteExtension(_) => "invalid_vote_extension",
        OracleError::ValidatorNotFound(_) => "unknown_validator",
        _ => "other",
    }
}

impl<S: KeyValueStore> OracleApp<S> {
    /// Prepend the injected vote-extension transaction to the proposal.
    pub fn prepare_proposal(&self, req: &RequestPrepareProposal) -> OracleResult<ResponsePrepareProposal> {
        let enabled = self.vote_extensions_enabled(req.height);
        validate_vote_extensions(
            self.keeper.staking(),
            self.verifier.as_ref(),
            &self.config.chain_id,
            enabled,
            req.height,
            &req.local_last_commit,
        )?;

        let mut txs = req.txs.clone();
        if enabled {
            let exchange_rate_votes =
                generate_exchange_rate_votes(self.keeper.staking(), req.height, &req.local_last_commit)?;
            let injected = InjectedVoteExtensionTx {
                exchange_rate_votes,
                extended_commit_info: encode_frame(&req.local_last_commit)?,
            };
            let bz = encode_frame(&injected).map_err(|e| {
                error!(subsystem = "oracle", height = req.height, error = %e, "failed to encode injected vote extension tx");
                OracleError::EncodeInjVoteExt
            })?;
            txs.insert(0, bz);
        }

        info!(
            subsystem = "oracle",
            height = req.height,
            txs = txs.len(),
            vote_extensions_enabled = enabled,
            "prepared proposal"
        );
        Ok(ResponsePrepareProposal { txs })
    }

    /// Accept the proposal only if its injected votes are exactly the ones
    /// this node derives from the embedded extended commit.
    pub fn process_proposal(&self, req: &RequestProcessProposal) -> ResponseProcessProposal {
        match self.check_proposal(req) {
            Ok(()) => {
                info!(
                    subsystem = "oracle",
                    height = req.height,
                    txs = req.txs.len(),
                    "processed proposal"
                );
                ResponseProcessProposal {
                    status: Status::Accept,
                }
            }
            Err(e) => {
                error!(subsystem = "oracle", height = req.height, error = %e, "rejecting proposal");
                crate::metrics::record_proposal_rejected(rejection_reason(&e));
                ResponseProcessProposal {
                    status: Status::Reject,
                }
            }
        }
    }

    /// The checks behind [`OracleApp::process_proposal`], with the reason.
    pub fn check_proposal(&self, req: &RequestProcessProposal) -> OracleResult<()> {
        if !self.vote_extensions_enabled(req.height) {
            return Ok(());
        }

        let first = req.txs.first().ok_or(OracleError::NoCommitInfo)?;
        let injected: InjectedVoteExtensionTx = decode_frame(first)
            .map_err(|e| invalid(format!("failed to decode injected vote extension tx: {e}")))?;
        let commit: ExtendedCommitInfo = decode_frame(&injected.extended_commit_info)
            .map_err(|e| invalid(format!("failed to decode injected extended commit info: {e}")))?;

        validate_vote_extensions(
            self.keeper.staking(),
            self.verifier.as_ref(),
            &self.config.chain_id,
            true,
            req.height,
            &commit,
        )?;

        let generated = generate_exchange_rate_votes(self.keeper.staking(), req.height, &commit)?;
        verify_exchange_rate_votes(&injected.exchange_rate_votes, &generated)
    }
}
