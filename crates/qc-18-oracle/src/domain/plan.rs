//! Height-scheduled parameter changes

use super::error::{OracleError, OracleResult};
use super::params::{ParamKey, Params};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A governance-approved parameter change due at `height`.
///
/// `changes` carries a full parameter set; only the listed `keys` are applied.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamUpdatePlan {
    pub keys: Vec<String>,
    pub height: u64,
    pub changes: Params,
}

impl ParamUpdatePlan {
    pub fn new(keys: Vec<String>, height: u64, changes: Params) -> Self {
        Self {
            keys,
            height,
            changes,
        }
    }

    /// Stateless checks: positive height, known keys, valid per-key values.
    pub fn validate_basic(&self) -> OracleResult<()> {
        if self.height == 0 {
            return Err(OracleError::InvalidRequest(
                "height must be greater than 0".into(),
            ));
        }
        for key in self.parsed_keys()? {
            self.changes.validate_key(key)?;
        }
        Ok(())
    }

    pub fn parsed_keys(&self) -> OracleResult<Vec<ParamKey>> {
        self.keys.iter().map(|k| k.parse()).collect()
    }

    pub fn should_execute(&self, height: u64) -> bool {
        self.height == height
    }

    /// Add `key` unless already listed.
    pub fn push_key(&mut self, key: ParamKey) {
        if !self.keys.iter().any(|k| k == key.as_str()) {
            self.keys.push(key.as_str().to_string());
        }
    }
}

impl fmt::Display for ParamUpdatePlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let changes = serde_json::to_string(&self.changes).map_err(|_| fmt::Error)?;
        write!(
            f,
            "Oracle Param Update Plan\n  Keys: {:?}\n  height: {}\n  Changes: {}.",
            self.keys, self.height, changes
        )
    }
}
