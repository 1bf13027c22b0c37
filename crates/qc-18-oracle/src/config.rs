//! Oracle configuration from environment variables.

use crate::domain::AccAddress;
use sha2::{Digest, Sha256};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Configuration errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("price feeder is enabled but no config path is set")]
    MissingFeederConfig,

    #[error("price feeder tick timeout must be greater than zero")]
    ZeroTickTimeout,

    #[error("chain id must not be empty")]
    EmptyChainId,
}

/// Module account address: the first 20 bytes of `SHA256(name)`.
pub fn module_address(name: &str) -> AccAddress {
    let digest = Sha256::digest(name.as_bytes());
    let mut out = [0u8; 20];
    out.copy_from_slice(&digest[..20]);
    AccAddress::new(out)
}

/// In-process price feeder settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeederConfig {
    /// Start the feeder from the end blocker.
    pub enable: bool,

    /// Feeder provider configuration file
    pub config_path: Option<PathBuf>,

    /// Log level handed to the feeder
    pub log_level: String,

    /// Upper bound for a single feeder tick
    pub tick_timeout: Duration,
}

impl Default for FeederConfig {
    fn default() -> Self {
        Self {
            enable: false,
            config_path: None,
            log_level: "info".to_string(),
            tick_timeout: Duration::from_secs(5),
        }
    }
}

/// Node-local settings of the oracle module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OracleConfig {
    pub feeder: FeederConfig,

    /// First height after which vote extensions are produced; 0 disables them.
    pub vote_extensions_enable_height: u64,

    /// Chain id bound into vote-extension signatures
    pub chain_id: String,

    /// Account allowed to run governance messages
    pub authority: AccAddress,

    /// Log level filter (trace, debug, info, warn, error)
    pub log_level: String,

    /// Whether to enable JSON formatted logs
    pub json_logs: bool,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            feeder: FeederConfig::default(),
            vote_extensions_enable_height: 0,
            chain_id: "quantum-chain".to_string(),
            authority: module_address("gov"),
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}

fn parse_bool(raw: &str) -> bool {
    raw.eq_ignore_ascii_case("true") || raw == "1"
}

fn invalid(key: &str, message: impl ToString) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        message: message.to_string(),
    }
}

impl OracleConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `QC_ORACLE_FEEDER_ENABLE`: Start the in-process feeder (default: false)
    /// - `QC_ORACLE_FEEDER_CONFIG`: Feeder config file path
    /// - `QC_ORACLE_FEEDER_LOG_LEVEL`: Feeder log level (default: info)
    /// - `QC_ORACLE_FEEDER_TICK_TIMEOUT_MS`: Tick timeout in ms (default: 5000)
    /// - `QC_ORACLE_VE_ENABLE_HEIGHT`: Vote extension enable height (default: 0)
    /// - `QC_CHAIN_ID`: Chain id (default: quantum-chain)
    /// - `QC_ORACLE_AUTHORITY`: Hex governance account (default: gov module account)
    /// - `QC_LOG_LEVEL` or `RUST_LOG`: Log level (default: info)
    /// - `QC_JSON_LOGS`: Enable JSON logs (default: false)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`OracleConfig::from_env`] with an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let tick_timeout = match lookup("QC_ORACLE_FEEDER_TICK_TIMEOUT_MS") {
            Some(raw) => Duration::from_millis(
                raw.parse()
                    .map_err(|e| invalid("QC_ORACLE_FEEDER_TICK_TIMEOUT_MS", e))?,
            ),
            None => defaults.feeder.tick_timeout,
        };

        let feeder = FeederConfig {
            enable: lookup("QC_ORACLE_FEEDER_ENABLE")
                .map(|v| parse_bool(&v))
                .unwrap_or(defaults.feeder.enable),
            config_path: lookup("QC_ORACLE_FEEDER_CONFIG")
                .filter(|v| !v.is_empty())
                .map(PathBuf::from),
            log_level: lookup("QC_ORACLE_FEEDER_LOG_LEVEL").unwrap_or(defaults.feeder.log_level),
            tick_timeout,
        };

        let vote_extensions_enable_height = match lookup("QC_ORACLE_VE_ENABLE_HEIGHT") {
            Some(raw) => raw
                .parse()
                .map_err(|e| invalid("QC_ORACLE_VE_ENABLE_HEIGHT", e))?,
            None => defaults.vote_extensions_enable_height,
        };

        let authority = match lookup("QC_ORACLE_AUTHORITY") {
            Some(raw) => raw
                .parse()
                .map_err(|e| invalid("QC_ORACLE_AUTHORITY", e))?,
            None => defaults.authority,
        };

        let config = Self {
            feeder,
            vote_extensions_enable_height,
            chain_id: lookup("QC_CHAIN_ID").unwrap_or(defaults.chain_id),
            authority,
            log_level: lookup("QC_LOG_LEVEL")
                .or_else(|| lookup("RUST_LOG"))
                .unwrap_or(defaults.log_level),
            json_logs: lookup("QC_JSON_LOGS")
                .map(|v| parse_bool(&v))
                .unwrap_or(defaults.json_logs),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.feeder.enable && self.feeder.config_path.is_none() {
            return Err(ConfigError::MissingFeederConfig);
        }
        if self.feeder.tick_timeout.is_zero() {
            return Err(ConfigError::ZeroTickTimeout);
        }
        if self.chain_id.is_empty() {
            return Err(ConfigError::EmptyChainId);
        }
        Ok(())
    }

    /// Vote extensions are produced and consumed at `height`.
    pub fn vote_extensions_enabled(&self, height: u64) -> bool {
        let enable_height = self.vote_extensions_enable_height;
        enable_height != 0 && height > 1 && height > enable_height
    }
}
