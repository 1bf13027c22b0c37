//! Account, operator and consensus addresses
//!
//! All three are 20-byte identifiers. They are distinct types so an operator
//! address can never be passed where a consensus address is expected.
//! Ordering is plain byte order, which is the tie-breaker used by ballots.

use super::error::OracleError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Length of every address in bytes.
pub const ADDRESS_LEN: usize = 20;

macro_rules! address_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub [u8; ADDRESS_LEN]);

        impl $name {
            pub const fn new(bytes: [u8; ADDRESS_LEN]) -> Self {
                Self(bytes)
            }

            pub fn as_bytes(&self) -> &[u8; ADDRESS_LEN] {
                &self.0
            }

            pub fn from_slice(bytes: &[u8]) -> Result<Self, OracleError> {
                let arr: [u8; ADDRESS_LEN] = bytes.try_into().map_err(|_| {
                    OracleError::InvalidAddress(format!(
                        "expected {} bytes, got {}",
                        ADDRESS_LEN,
                        bytes.len()
                    ))
                })?;
                Ok(Self(arr))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&hex::encode(self.0))
            }
        }

        impl FromStr for $name {
            type Err = OracleError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let bytes = hex::decode(s)
                    .map_err(|e| OracleError::InvalidAddress(format!("{s}: {e}")))?;
                Self::from_slice(&bytes)
            }
        }
    };
}

address_type!(
    /// Validator operator address.
    ValAddress
);
address_type!(
    /// Plain account address, used for feeders and the governance authority.
    AccAddress
);
address_type!(
    /// Consensus (CometBFT) address derived from the validator's consensus key.
    ConsAddress
);

impl From<ValAddress> for AccAddress {
    fn from(val: ValAddress) -> Self {
        AccAddress(val.0)
    }
}
