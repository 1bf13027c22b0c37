//! Height-scheduled parameter updates

use super::OracleKeeper;
use crate::domain::{
    param_update_plan_key, OracleError, OracleResult, ParamUpdatePlan, Params,
    PREFIX_PARAM_UPDATE_PLAN,
};
use crate::events::OracleEvent;
use crate::ports::KeyValueStore;
use tracing::info;

impl<S: KeyValueStore> OracleKeeper<S> {
    /// Store `plan` for execution at `plan.height`, replacing any plan already
    /// scheduled there.
    ///
    /// The height must lie strictly after `current_height` and the current
    /// params with the plan's keys applied must validate.
    pub fn schedule_param_update_plan(
        &mut self,
        plan: &ParamUpdatePlan,
        current_height: u64,
    ) -> OracleResult<()> {
        if plan.height <= current_height {
            return Err(OracleError::InvalidRequest(
                "param update cannot be scheduled in the past".into(),
            ));
        }
        self.validate_param_changes(&plan.keys, &plan.changes)?;
        self.put_value(&param_update_plan_key(plan.height), plan)
    }

    /// Apply `keys` from `changes` onto the current params and validate the result.
    pub fn validate_param_changes(&self, keys: &[String], changes: &Params) -> OracleResult<Params> {
        let mut params = self.params()?;
        for key in keys {
            params.apply_key(key.parse()?, changes);
        }
        params.validate()?;
        Ok(params)
    }

    pub fn param_update_plan(&self, height: u64) -> OracleResult<Option<ParamUpdatePlan>> {
        self.get_value(&param_update_plan_key(height))
    }

    /// All scheduled plans by ascending height.
    pub fn param_update_plans(&self) -> OracleResult<Vec<ParamUpdatePlan>> {
        Ok(self
            .scan_values(&[PREFIX_PARAM_UPDATE_PLAN])?
            .into_iter()
            .map(|(_, plan)| plan)
            .collect())
    }

    pub fn clear_param_update_plan(&mut self, height: u64) -> OracleResult<()> {
        let key = param_update_plan_key(height);
        if !self.store().exists(&key)? {
            return Err(OracleError::InvalidRequest(format!(
                "No param update plan found at block height {height}"
            )));
        }
        self.delete_key(&key)
    }

    /// Apply the plan's keys, notify the price feeder and remove the plan.
    pub fn execute_param_update_plan(&mut self, plan: &ParamUpdatePlan) -> OracleResult<()> {
        let mut params = self.params()?;
        for key in plan.parsed_keys()? {
            params.apply_key(key, &plan.changes);
        }
        self.set_params(&params)?;

        info!(subsystem = "oracle", height = plan.height, keys = ?plan.keys, "param update plan executed");
        self.emit(OracleEvent::ParamUpdate {
            notify_price_feeder: true,
        });
        self.clear_param_update_plan(plan.height)
    }

    /// Execute every plan due at `height`. Returns how many ran.
    pub fn execute_due_param_update_plans(&mut self, height: u64) -> OracleResult<usize> {
        let mut executed = 0;
        for plan in self.param_update_plans()? {
            if plan.should_execute(height) {
                self.execute_param_update_plan(&plan)?;
                executed += 1;
            }
        }
        Ok(executed)
    }
}
