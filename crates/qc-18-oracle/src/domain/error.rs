//! Error types for the Oracle subsystem
//!
//! Every variant that mirrors a registered module error carries a stable
//! numeric code (see [`OracleError::code`]) so clients can match on it
//! without parsing messages.

/// Key-value store failures surfaced by a [`crate::ports::KeyValueStore`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KVStoreError {
    #[error("Store I/O error: {message}")]
    IOError { message: String },

    #[error("Stored value is corrupted at key {key}: {message}")]
    Corrupted { key: String, message: String },
}

/// Oracle error types
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OracleError {
    #[error("invalid exchange rate: {0}")]
    InvalidExchangeRate(String),

    #[error("no prevote")]
    NoPrevote,

    #[error("no vote")]
    NoVote,

    #[error("unauthorized voter: {feeder}")]
    NoVotingPermission { feeder: String },

    #[error("invalid hash: {0}")]
    InvalidHash(String),

    #[error("invalid hash length; should equal {expected}")]
    InvalidHashLength { expected: usize },

    #[error("hash verification failed: must be given {expected} not {actual}")]
    VerificationFailed { expected: String, actual: String },

    #[error("reveal period of submitted vote does not match with registered prevote")]
    RevealPeriodMissMatch,

    #[error("invalid salt length; must be 64")]
    InvalidSaltLength,

    #[error("invalid salt format: salt must be a valid hex string")]
    InvalidSaltFormat,

    #[error("no aggregate prevote: {voter}")]
    NoAggregatePrevote { voter: String },

    #[error("no aggregate vote: {voter}")]
    NoAggregateVote { voter: String },

    #[error("unknown denom: {0}")]
    UnknownDenom(String),

    #[error("invalid exchange rate; should be positive")]
    NegativeOrZeroRate,

    #[error("prevote already submitted for this voting period")]
    ExistingPrevote,

    #[error("ballot must be sorted before this operation")]
    BallotNotSorted,

    #[error("invalid or unavailable oracle price")]
    InvalidOraclePrice,

    #[error("no historic price for this denom at this block: {denom}")]
    NoHistoricPrice { denom: String },

    #[error("no median for this denom at this block: {denom}")]
    NoMedian { denom: String },

    #[error("no median deviation for this denom at this block: {denom}")]
    NoMedianDeviation { denom: String },

    #[error("unable to find the reward band the given asset: {0}")]
    NoRewardBand(String),

    #[error("unable to find the latest validator reward set")]
    NoValidatorRewardSet,

    #[error("invalid gov authority to perform these changes; expected {expected}, got {actual}")]
    NoGovAuthority { expected: String, actual: String },

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("invalid oracle param value: {0}")]
    InvalidParamValue(String),

    #[error("failed to encode injected vote extension tx")]
    EncodeInjVoteExt,

    #[error("number of exchange rate votes in vote extension and extended commit info are not equal")]
    NonEqualInjVotesLen,

    #[error("injected exchange rate votes and generated exchange votes are not equal")]
    NonEqualInjVotesRates,

    #[error("no commit info in process proposal request")]
    NoCommitInfo,

    #[error("invalid WMA strategy: {0}")]
    InvalidWmaStrategy(String),

    #[error("custom_weights must have exactly {expected} elements (one per period), got {actual}")]
    InvalidCustomWeights { expected: usize, actual: usize },

    #[error("{0} is not an existing oracle param key")]
    UnknownParamKey(String),

    #[error("empty list: {0}")]
    EmptyList(String),

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("validator does not exist: {0}")]
    ValidatorNotFound(String),

    #[error("conversion error: {0}")]
    Conversion(String),

    #[error("invalid vote extension: {0}")]
    InvalidVoteExtension(String),

    #[error("arithmetic overflow: {0}")]
    Arithmetic(String),

    #[error("codec error: {0}")]
    Codec(String),

    #[error("staking keeper error: {0}")]
    Staking(String),

    #[error("bank keeper error: {0}")]
    Bank(String),

    #[error("store error: {0}")]
    Store(#[from] KVStoreError),
}

impl OracleError {
    /// Registered module error code, `None` for crate-local failures.
    pub fn code(&self) -> Option<u32> {
        let code = match self {
            OracleError::InvalidExchangeRate(_) => 2,
            OracleError::NoPrevote => 3,
            OracleError::NoVote => 4,
            OracleError::NoVotingPermission { .. } => 5,
            OracleError::InvalidHash(_) => 6,
            OracleError::InvalidHashLength { .. } => 7,
            OracleError::VerificationFailed { .. } => 8,
            OracleError::RevealPeriodMissMatch => 9,
            OracleError::InvalidSaltLength => 10,
            OracleError::InvalidSaltFormat => 11,
            OracleError::NoAggregatePrevote { .. } => 12,
            OracleError::NoAggregateVote { .. } => 13,
            OracleError::UnknownDenom(_) => 14,
            OracleError::NegativeOrZeroRate => 15,
            OracleError::ExistingPrevote => 16,
            OracleError::BallotNotSorted => 17,
            OracleError::InvalidOraclePrice => 18,
            OracleError::NoHistoricPrice { .. } => 19,
            OracleError::NoMedian { .. } => 20,
            OracleError::NoMedianDeviation { .. } => 21,
            OracleError::NoRewardBand(_) => 22,
            OracleError::NoValidatorRewardSet => 23,
            OracleError::NoGovAuthority { .. } => 24,
            OracleError::InvalidRequest(_) => 25,
            OracleError::InvalidParamValue(_) => 26,
            OracleError::EncodeInjVoteExt => 27,
            OracleError::NonEqualInjVotesLen => 28,
            OracleError::NonEqualInjVotesRates => 29,
            OracleError::NoCommitInfo => 30,
            OracleError::InvalidWmaStrategy(_) | OracleError::InvalidCustomWeights { .. } => 31,
            _ => return None,
        };
        Some(code)
    }
}

/// Result type for oracle operations
pub type OracleResult<T> = Result<T, OracleError>;
