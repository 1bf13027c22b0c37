//! Read-only queries

use crate::domain::{
    sort_stamps, AccAddress, AggregateExchangeRatePrevote, AggregateExchangeRateVote, Coin,
    Decimal, ExchangeRateTuple, OracleError, OracleResult, Params, PriceStamp, ValAddress,
    WmaStrategy,
};
use crate::keeper::OracleKeeper;
use crate::ports::KeyValueStore;

/// Answers queries against the state at `height`.
pub struct OracleQuerier<'k, S: KeyValueStore> {
    keeper: &'k OracleKeeper<S>,
    height: u64,
}

impl<'k, S: KeyValueStore> OracleQuerier<'k, S> {
    pub fn new(keeper: &'k OracleKeeper<S>, height: u64) -> Self {
        Self { keeper, height }
    }

    pub fn params(&self) -> OracleResult<Params> {
        self.keeper.params()
    }

    /// Current rate of `denom`, or every current rate when `denom` is `None`.
    pub fn exchange_rates(&self, denom: Option<&str>) -> OracleResult<Vec<ExchangeRateTuple>> {
        match denom {
            Some(denom) => {
                let rate = self.keeper.exchange_rate(denom)?;
                Ok(vec![ExchangeRateTuple::new(denom.to_uppercase(), rate)])
            }
            None => Ok(self
                .keeper
                .exchange_rates()?
                .into_iter()
                .map(|(d, r)| ExchangeRateTuple::new(d, r))
                .collect()),
        }
    }

    /// Denoms that currently have a rate.
    pub fn active_exchange_rates(&self) -> OracleResult<Vec<String>> {
        Ok(self
            .keeper
            .exchange_rates()?
            .into_iter()
            .map(|(d, _)| d)
            .collect())
    }

    pub fn feeder_delegation(&self, operator: &ValAddress) -> OracleResult<AccAddress> {
        self.keeper.feeder_delegation(operator)
    }

    pub fn miss_counter(&self, operator: &ValAddress) -> OracleResult<u64> {
        self.keeper.miss_counter(operator)
    }

    /// Vote periods elapsed in the current slash window.
    pub fn slash_window(&self) -> OracleResult<u64> {
        let params = self.keeper.params()?;
        Ok((self.height % params.slash_window) / params.vote_period)
    }

    pub fn aggregate_prevote(&self, voter: &ValAddress) -> OracleResult<AggregateExchangeRatePrevote> {
        self.keeper.aggregate_prevote(voter)
    }

    pub fn aggregate_prevotes(&self) -> OracleResult<Vec<AggregateExchangeRatePrevote>> {
        self.keeper.aggregate_prevotes()
    }

    pub fn aggregate_vote(&self, voter: &ValAddress) -> OracleResult<AggregateExchangeRateVote> {
        self.keeper.aggregate_vote(voter)
    }

    pub fn aggregate_votes(&self) -> OracleResult<Vec<AggregateExchangeRateVote>> {
        self.keeper.aggregate_votes()
    }

    /// Last `num_stamps` medians of `denom` (capped at `MaximumMedianStamps`),
    /// or every stored median sorted by denom and block when `denom` is `None`.
    pub fn medians(&self, denom: Option<&str>, num_stamps: u64) -> OracleResult<Vec<PriceStamp>> {
        match denom {
            Some(denom) => {
                if num_stamps == 0 {
                    return Err(OracleError::InvalidRequest(
                        "parameter NumStamps must be greater than 0".into(),
                    ));
                }
                let cap = self.keeper.params()?.maximum_median_stamps;
                self.keeper
                    .historic_medians(&denom.to_uppercase(), num_stamps.min(cap))
            }
            None => {
                let mut medians = self.keeper.all_median_prices()?;
                sort_stamps(&mut medians);
                Ok(medians)
            }
        }
    }

    /// Deviation stamped at the last median boundary for `denom`, or every
    /// stored deviation when `denom` is `None`.
    pub fn median_deviations(&self, denom: Option<&str>) -> OracleResult<Vec<PriceStamp>> {
        match denom {
            Some(denom) => Ok(vec![self
                .keeper
                .historic_median_deviation(&denom.to_uppercase(), self.height)?]),
            None => {
                let mut deviations = self.keeper.all_median_deviation_prices()?;
                sort_stamps(&mut deviations);
                Ok(deviations)
            }
        }
    }

    pub fn validator_reward_set(&self) -> OracleResult<Vec<ValAddress>> {
        self.keeper.validator_reward_set()
    }

    pub fn sma(&self, denom: &str) -> OracleResult<Decimal> {
        self.keeper
            .sma(&denom.to_uppercase())?
            .ok_or_else(|| OracleError::InvalidRequest(format!("sma not present for denom: {denom}")))
    }

    pub fn ema(&self, denom: &str) -> OracleResult<Decimal> {
        self.keeper
            .ema(&denom.to_uppercase())?
            .ok_or_else(|| OracleError::InvalidRequest(format!("ema not present for denom: {denom}")))
    }

    /// Stored WMA for `strategy`; `CUSTOM` is computed from the live window
    /// with `custom_weights`.
    pub fn wma(&self, denom: &str, strategy: &str, custom_weights: &[Decimal]) -> OracleResult<Decimal> {
        let symbol = denom.to_uppercase();
        match strategy.parse::<WmaStrategy>()? {
            WmaStrategy::Custom => self.keeper.custom_wma(&symbol, custom_weights),
            strategy => self.keeper.wma(&symbol, strategy)?.ok_or_else(|| {
                OracleError::InvalidRequest(format!(
                    "no WMA found for denom: {denom} with strategy: {strategy}"
                ))
            }),
        }
    }

    pub fn convert_usdc_to_cheq(
        &self,
        amount: &str,
        ma_type: &str,
        wma_strategy: &str,
        custom_weights: &[Decimal],
    ) -> OracleResult<Coin> {
        self.keeper
            .convert_usdc_to_cheq(amount, ma_type, wma_strategy, custom_weights)
    }
}
