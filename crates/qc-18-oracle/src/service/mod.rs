//! Oracle Service - message handling and queries
//!
//! Both entry points borrow the keeper for the duration of one block context:
//!
//! - [`OracleMsgServer`]: commit-reveal voting, feeder delegation and
//!   governance messages. Every message is checked with `validate_basic`
//!   first; a rejected message leaves the store untouched.
//! - [`OracleQuerier`]: read-only views over rates, votes, historic
//!   analytics and conversions.

mod msg_server;
mod query;

pub use msg_server::*;
pub use query::*;

use crate::domain::{AccAddress, OracleError, OracleResult};

/// Reject governance messages not signed by the configured authority.
pub(crate) fn ensure_authority(expected: &AccAddress, actual: &AccAddress) -> OracleResult<()> {
    if expected != actual {
        return Err(OracleError::NoGovAuthority {
            expected: expected.to_string(),
            actual: actual.to_string(),
        });
    }
    Ok(())
}
