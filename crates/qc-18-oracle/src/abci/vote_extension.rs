//! ExtendVote and VerifyVoteExtension

use super::codec::{decode_frame, encode_frame};
use super::types::{
    RequestExtendVote, RequestVerifyVoteExtension, ResponseExtendVote,
    ResponseVerifyVoteExtension, Status,
};
use super::OracleApp;
use crate::domain::{
    format_exchange_rates, parse_exchange_rates, OracleError, OracleResult, OracleVoteExtension,
};
use crate::ports::KeyValueStore;
use tracing::{error, info, warn};

impl<S: KeyValueStore> OracleApp<S> {
    /// Build this validator's vote extension from the feeder's latest prices,
    /// keeping only accepted denoms.
    ///
    /// Without a running feeder the extension is empty. Empty extensions are
    /// accepted by every validator.
    pub fn extend_vote(&self, req: &RequestExtendVote) -> OracleResult<ResponseExtendVote> {
        let Some(feeder) = self.feeder.as_ref().filter(|f| f.is_started()) else {
            warn!(subsystem = "oracle", height = req.height, "price feeder oracle not set");
            return Ok(ResponseExtendVote::default());
        };

        let prices = feeder.prices();
        let exchange_rates = match parse_exchange_rates(&format_exchange_rates(&prices)) {
            Ok(rates) => rates,
            Err(e) => {
                error!(
                    subsystem = "oracle",
                    height = req.height,
                    error = %e,
                    "extend vote handler received invalid exchange rate"
                );
                return Ok(ResponseExtendVote::default());
            }
        };

        let accept_list = self.keeper.params()?.accept_list;
        let vote_ext = OracleVoteExtension {
            height: req.height,
            exchange_rates: exchange_rates
                .into_iter()
                .filter(|r| accept_list.contains(&r.denom))
                .collect(),
        };

        let vote_extension = encode_frame(&vote_ext).map_err(OracleError::from)?;
        info!(
            subsystem = "oracle",
            height = req.height,
            rates = vote_ext.exchange_rates.len(),
            "created vote extension"
        );
        Ok(ResponseExtendVote { vote_extension })
    }

    /// Accept an extension that is empty, or that decodes and names the
    /// request height.
    pub fn verify_vote_extension(&self, req: &RequestVerifyVoteExtension) -> ResponseVerifyVoteExtension {
        let status = match check_vote_extension(req) {
            Ok(()) => Status::Accept,
            Err(e) => {
                error!(
                    subsystem = "oracle",
                    height = req.height,
                    validator = %req.validator_address,
                    error = %e,
                    "rejecting vote extension"
                );
                Status::Reject
            }
        };
        ResponseVerifyVoteExtension { status }
    }
}

fn check_vote_extension(req: &RequestVerifyVoteExtension) -> OracleResult<()> {
    if req.vote_extension.is_empty() {
        return Ok(());
    }

    let vote_ext: OracleVoteExtension = decode_frame(&req.vote_extension).map_err(|e| {
        OracleError::InvalidVoteExtension(format!("failed to decode vote extension: {e}"))
    })?;

    if vote_ext.height != req.height {
        return Err(OracleError::InvalidVoteExtension(format!(
            "vote extension height doesn't match request height; expected: {}, got: {}",
            req.height, vote_ext.height
        )));
    }
    Ok(())
}
