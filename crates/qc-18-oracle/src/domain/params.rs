//! Oracle module parameters
//!
//! # Invariants
//!
//! - `VotePeriod > 0`; `SlashWindow`, `HistoricStampPeriod` and
//!   `MedianStampPeriod` are exact multiples of it.
//! - `0.33 < VoteThreshold <= 1` with at most two decimals.
//! - `HistoricStampPeriod <= MedianStampPeriod`.
//! - Every MandatoryList denom is also in the AcceptList.

use super::decimal::Decimal;
use super::denom::*;
use super::error::{OracleError, OracleResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const BLOCKS_PER_MINUTE: u64 = 10;
pub const BLOCKS_PER_HOUR: u64 = BLOCKS_PER_MINUTE * 60;
pub const BLOCKS_PER_DAY: u64 = BLOCKS_PER_HOUR * 24;
pub const BLOCKS_PER_WEEK: u64 = BLOCKS_PER_DAY * 7;
pub const BLOCKS_PER_YEAR: u64 = BLOCKS_PER_DAY * 365;

pub const DEFAULT_VOTE_PERIOD: u64 = 10;
pub const DEFAULT_SLASH_WINDOW: u64 = BLOCKS_PER_WEEK;
pub const DEFAULT_REWARD_DISTRIBUTION_WINDOW: u64 = BLOCKS_PER_YEAR;
pub const DEFAULT_HISTORIC_STAMP_PERIOD: u64 = BLOCKS_PER_MINUTE * 3;
pub const DEFAULT_MAXIMUM_PRICE_STAMPS: u64 = 60;
pub const DEFAULT_MEDIAN_STAMP_PERIOD: u64 = BLOCKS_PER_HOUR * 3;
pub const DEFAULT_MAXIMUM_MEDIAN_STAMPS: u64 = 24;
pub const DEFAULT_AVERAGING_WINDOW: u64 = 3;

/// Maximum number of decimals allowed for VoteThreshold.
pub const MAX_VOTE_THRESHOLD_PRECISION: u32 = 2;

/// Names of the individually updatable parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParamKey {
    VotePeriod,
    VoteThreshold,
    RewardBands,
    RewardDistributionWindow,
    AcceptList,
    MandatoryList,
    SlashFraction,
    SlashWindow,
    MinValidPerWindow,
    HistoricStampPeriod,
    MedianStampPeriod,
    MaximumPriceStamps,
    MaximumMedianStamps,
    CurrencyPairProviders,
    CurrencyDeviationThresholds,
    UsdcIbcDenom,
    SlashingEnabled,
    AveragingWindow,
}

impl ParamKey {
    pub const ALL: [ParamKey; 18] = [
        ParamKey::VotePeriod,
        ParamKey::VoteThreshold,
        ParamKey::RewardBands,
        ParamKey::RewardDistributionWindow,
        ParamKey::AcceptList,
        ParamKey::MandatoryList,
        ParamKey::SlashFraction,
        ParamKey::SlashWindow,
        ParamKey::MinValidPerWindow,
        ParamKey::HistoricStampPeriod,
        ParamKey::MedianStampPeriod,
        ParamKey::MaximumPriceStamps,
        ParamKey::MaximumMedianStamps,
        ParamKey::CurrencyPairProviders,
        ParamKey::CurrencyDeviationThresholds,
        ParamKey::UsdcIbcDenom,
        ParamKey::SlashingEnabled,
        ParamKey::AveragingWindow,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ParamKey::VotePeriod => "VotePeriod",
            ParamKey::VoteThreshold => "VoteThreshold",
            ParamKey::RewardBands => "RewardBands",
            ParamKey::RewardDistributionWindow => "RewardDistributionWindow",
            ParamKey::AcceptList => "AcceptList",
            ParamKey::MandatoryList => "MandatoryList",
            ParamKey::SlashFraction => "SlashFraction",
            ParamKey::SlashWindow => "SlashWindow",
            ParamKey::MinValidPerWindow => "MinValidPerWindow",
            ParamKey::HistoricStampPeriod => "HistoricStampPeriod",
            ParamKey::MedianStampPeriod => "MedianStampPeriod",
            ParamKey::MaximumPriceStamps => "MaximumPriceStamps",
            ParamKey::MaximumMedianStamps => "MaximumMedianStamps",
            ParamKey::CurrencyPairProviders => "CurrencyPairProviders",
            ParamKey::CurrencyDeviationThresholds => "CurrencyDeviationThresholds",
            ParamKey::UsdcIbcDenom => "UsdcIbcDenom",
            ParamKey::SlashingEnabled => "SlashingEnabled",
            ParamKey::AveragingWindow => "AveragingWindow",
        }
    }
}

impl fmt::Display for ParamKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ParamKey {
    type Err = OracleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ParamKey::ALL
            .iter()
            .copied()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| OracleError::UnknownParamKey(s.to_string()))
    }
}

/// Oracle parameters
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Params {
    pub vote_period: u64,
    pub vote_threshold: Decimal,
    pub reward_bands: RewardBandList,
    pub reward_distribution_window: u64,
    pub accept_list: DenomList,
    pub mandatory_list: DenomList,
    pub slash_fraction: Decimal,
    pub slash_window: u64,
    pub min_valid_per_window: Decimal,
    pub historic_stamp_period: u64,
    pub median_stamp_period: u64,
    pub maximum_price_stamps: u64,
    pub maximum_median_stamps: u64,
    pub currency_pair_providers: CurrencyPairProvidersList,
    pub currency_deviation_thresholds: CurrencyDeviationThresholdList,
    pub usdc_ibc_denom: String,
    pub slashing_enabled: bool,
    pub averaging_window: u64,
}

impl Default for Params {
    fn default() -> Self {
        let assets = DenomList(vec![
            Denom::new(CHEQD_DENOM, CHEQD_SYMBOL, CHEQD_EXPONENT),
            Denom::new(USDT_DENOM, USDT_SYMBOL, USDT_EXPONENT),
            Denom::new(USDC_DENOM, USDC_SYMBOL, USDC_EXPONENT),
        ]);
        let mut reward_bands = RewardBandList::default();
        for symbol in [CHEQD_SYMBOL, USDT_SYMBOL, USDC_SYMBOL] {
            reward_bands.add_default(symbol);
        }

        Self {
            vote_period: DEFAULT_VOTE_PERIOD,
            vote_threshold: Decimal::new(50, 2),
            reward_bands,
            reward_distribution_window: DEFAULT_REWARD_DISTRIBUTION_WINDOW,
            accept_list: assets.clone(),
            mandatory_list: assets,
            slash_fraction: Decimal::new(1, 4),
            slash_window: DEFAULT_SLASH_WINDOW,
            min_valid_per_window: Decimal::new(5, 2),
            historic_stamp_period: DEFAULT_HISTORIC_STAMP_PERIOD,
            median_stamp_period: DEFAULT_MEDIAN_STAMP_PERIOD,
            maximum_price_stamps: DEFAULT_MAXIMUM_PRICE_STAMPS,
            maximum_median_stamps: DEFAULT_MAXIMUM_MEDIAN_STAMPS,
            currency_pair_providers: CurrencyPairProvidersList(vec![
                CurrencyPairProviders::new(USDT_SYMBOL, USD_SYMBOL, &["coinbase"]),
                CurrencyPairProviders::new(USDC_SYMBOL, USDT_SYMBOL, &["mexc"]),
                CurrencyPairProviders::new(CHEQD_SYMBOL, USDT_SYMBOL, &["mexc"]),
                CurrencyPairProviders::new(CHEQD_SYMBOL, USDC_SYMBOL, &["osmosis-icq"]),
            ]),
            currency_deviation_thresholds: CurrencyDeviationThresholdList(
                [CHEQD_SYMBOL, USDT_SYMBOL, USDC_SYMBOL]
                    .iter()
                    .map(|s| CurrencyDeviationThreshold {
                        base_denom: s.to_string(),
                        threshold: "2".to_string(),
                    })
                    .collect(),
            ),
            usdc_ibc_denom: USDC_DENOM.to_string(),
            slashing_enabled: true,
            averaging_window: DEFAULT_AVERAGING_WINDOW,
        }
    }
}

impl fmt::Display for Params {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let out = serde_json::to_string_pretty(self).map_err(|_| fmt::Error)?;
        f.write_str(&out)
    }
}

fn invalid(msg: impl Into<String>) -> OracleError {
    OracleError::InvalidParamValue(msg.into())
}

fn validate_unit_interval(name: &str, v: Decimal) -> OracleResult<()> {
    if v < Decimal::ZERO || v > Decimal::ONE {
        return Err(invalid(format!(
            "oracle parameter {name} must be between [0, 1]"
        )));
    }
    Ok(())
}

fn validate_positive(name: &str, v: u64) -> OracleResult<()> {
    if v == 0 {
        return Err(invalid(format!("oracle parameter {name} must be > 0")));
    }
    Ok(())
}

pub fn validate_vote_threshold(v: Decimal) -> OracleResult<()> {
    let min = Decimal::new(33, 2);
    if v <= min || v > Decimal::ONE {
        return Err(invalid(format!("threshold must be bigger than {min} and <= 1")));
    }
    if v.normalize().scale() > MAX_VOTE_THRESHOLD_PRECISION {
        return Err(invalid("threshold precision must be maximum 2 decimals"));
    }
    Ok(())
}

pub fn validate_denom_list(list: &DenomList) -> OracleResult<()> {
    for d in list.iter() {
        if d.base_denom.is_empty() {
            return Err(invalid("oracle parameter AcceptList Denom must have BaseDenom"));
        }
        if d.symbol_denom.is_empty() {
            return Err(invalid("oracle parameter AcceptList Denom must have SymbolDenom"));
        }
    }
    Ok(())
}

pub fn validate_reward_bands(bands: &RewardBandList) -> OracleResult<()> {
    for band in bands.iter() {
        validate_unit_interval("RewardBand", band.reward_band)?;
        if band.symbol_denom.is_empty() {
            return Err(invalid("oracle parameter RewardBand must have SymbolDenom"));
        }
    }
    Ok(())
}

pub fn validate_currency_pair_providers(list: &CurrencyPairProvidersList) -> OracleResult<()> {
    for c in list.iter() {
        if c.base_denom.is_empty() {
            return Err(invalid("oracle parameter CurrencyPairProviders must have BaseDenom"));
        }
        if c.quote_denom.is_empty() {
            return Err(invalid("oracle parameter CurrencyPairProviders must have QuoteDenom"));
        }
        if c.providers.is_empty() {
            return Err(invalid(
                "oracle parameter CurrencyPairProviders must have at least 1 provider listed",
            ));
        }
    }
    Ok(())
}

pub fn validate_currency_deviation_thresholds(
    list: &CurrencyDeviationThresholdList,
) -> OracleResult<()> {
    for c in list.iter() {
        if c.base_denom.is_empty() {
            return Err(invalid(
                "oracle parameter CurrencyDeviationThreshold must have BaseDenom",
            ));
        }
        if c.threshold.is_empty() {
            return Err(invalid(
                "oracle parameter CurrencyDeviationThreshold must have Threshold",
            ));
        }
    }
    Ok(())
}

impl Params {
    /// Check the value of a single key in isolation.
    pub fn validate_key(&self, key: ParamKey) -> OracleResult<()> {
        match key {
            ParamKey::VotePeriod => validate_positive("VotePeriod", self.vote_period),
            ParamKey::VoteThreshold => validate_vote_threshold(self.vote_threshold),
            ParamKey::RewardBands => validate_reward_bands(&self.reward_bands),
            ParamKey::RewardDistributionWindow => {
                validate_positive("RewardDistributionWindow", self.reward_distribution_window)
            }
            ParamKey::AcceptList => validate_denom_list(&self.accept_list),
            ParamKey::MandatoryList => validate_denom_list(&self.mandatory_list),
            ParamKey::SlashFraction => validate_unit_interval("SlashFraction", self.slash_fraction),
            ParamKey::SlashWindow => validate_positive("SlashWindow", self.slash_window),
            ParamKey::MinValidPerWindow => {
                validate_unit_interval("MinValidPerWindow", self.min_valid_per_window)
            }
            ParamKey::HistoricStampPeriod => {
                validate_positive("HistoricStampPeriod", self.historic_stamp_period)
            }
            ParamKey::MedianStampPeriod => {
                validate_positive("MedianStampPeriod", self.median_stamp_period)
            }
            ParamKey::MaximumPriceStamps => {
                validate_positive("MaximumPriceStamps", self.maximum_price_stamps)
            }
            ParamKey::MaximumMedianStamps => {
                validate_positive("MaximumMedianStamps", self.maximum_median_stamps)
            }
            ParamKey::CurrencyPairProviders => {
                validate_currency_pair_providers(&self.currency_pair_providers)
            }
            ParamKey::CurrencyDeviationThresholds => {
                validate_currency_deviation_thresholds(&self.currency_deviation_thresholds)
            }
            ParamKey::UsdcIbcDenom | ParamKey::SlashingEnabled => Ok(()),
            ParamKey::AveragingWindow => validate_positive("AveragingWindow", self.averaging_window),
        }
    }

    /// Validate the full parameter set, including cross-parameter invariants.
    pub fn validate(&self) -> OracleResult<()> {
        if self.vote_period == 0 {
            return Err(invalid("oracle parameter VotePeriod must be > 0"));
        }
        validate_vote_threshold(self.vote_threshold)?;
        if self.reward_distribution_window < self.vote_period {
            return Err(invalid(
                "oracle parameter RewardDistributionWindow must be greater than or equal with VotePeriod",
            ));
        }
        validate_unit_interval("SlashFraction", self.slash_fraction)?;
        if self.slash_window < self.vote_period {
            return Err(invalid(
                "oracle parameter SlashWindow must be greater than or equal with VotePeriod",
            ));
        }
        if self.slash_window % self.vote_period != 0 {
            return Err(invalid(
                "oracle parameter SlashWindow must be an exact multiple of VotePeriod",
            ));
        }
        validate_unit_interval("MinValidPerWindow", self.min_valid_per_window)?;
        validate_denom_list(&self.accept_list)?;
        validate_denom_list(&self.mandatory_list)?;
        validate_positive("HistoricStampPeriod", self.historic_stamp_period)?;
        validate_positive("MedianStampPeriod", self.median_stamp_period)?;
        validate_positive("MaximumPriceStamps", self.maximum_price_stamps)?;
        validate_positive("MaximumMedianStamps", self.maximum_median_stamps)?;
        validate_positive("AveragingWindow", self.averaging_window)?;
        if self.historic_stamp_period > self.median_stamp_period {
            return Err(invalid(
                "oracle parameter MedianStampPeriod must be greater than or equal with HistoricStampPeriod",
            ));
        }
        if self.historic_stamp_period % self.vote_period != 0
            || self.median_stamp_period % self.vote_period != 0
        {
            return Err(invalid(
                "oracle parameters HistoricStampPeriod and MedianStampPeriod must be exact multiples of VotePeriod",
            ));
        }
        validate_reward_bands(&self.reward_bands)?;
        if !self.accept_list.contain_denoms(&self.mandatory_list) {
            return Err(invalid("denom in MandatoryList not present in AcceptList"));
        }
        validate_currency_pair_providers(&self.currency_pair_providers)?;
        validate_currency_deviation_thresholds(&self.currency_deviation_thresholds)?;
        Ok(())
    }

    /// Copy the value of `key` from `changes` into `self`. Denom lists are normalized.
    pub fn apply_key(&mut self, key: ParamKey, changes: &Params) {
        match key {
            ParamKey::VotePeriod => self.vote_period = changes.vote_period,
            ParamKey::VoteThreshold => self.vote_threshold = changes.vote_threshold,
            ParamKey::RewardBands => self.reward_bands = changes.reward_bands.clone(),
            ParamKey::RewardDistributionWindow => {
                self.reward_distribution_window = changes.reward_distribution_window
            }
            ParamKey::AcceptList => self.accept_list = changes.accept_list.normalize(),
            ParamKey::MandatoryList => self.mandatory_list = changes.mandatory_list.normalize(),
            ParamKey::SlashFraction => self.slash_fraction = changes.slash_fraction,
            ParamKey::SlashWindow => self.slash_window = changes.slash_window,
            ParamKey::MinValidPerWindow => self.min_valid_per_window = changes.min_valid_per_window,
            ParamKey::HistoricStampPeriod => {
                self.historic_stamp_period = changes.historic_stamp_period
            }
            ParamKey::MedianStampPeriod => self.median_stamp_period = changes.median_stamp_period,
            ParamKey::MaximumPriceStamps => {
                self.maximum_price_stamps = changes.maximum_price_stamps
            }
            ParamKey::MaximumMedianStamps => {
                self.maximum_median_stamps = changes.maximum_median_stamps
            }
            ParamKey::CurrencyPairProviders => {
                self.currency_pair_providers = changes.currency_pair_providers.clone()
            }
            ParamKey::CurrencyDeviationThresholds => {
                self.currency_deviation_thresholds = changes.currency_deviation_thresholds.clone()
            }
            ParamKey::UsdcIbcDenom => self.usdc_ibc_denom = changes.usdc_ibc_denom.clone(),
            ParamKey::SlashingEnabled => self.slashing_enabled = changes.slashing_enabled,
            ParamKey::AveragingWindow => self.averaging_window = changes.averaging_window,
        }
    }

    /// Number of vote periods in a slash window.
    pub fn vote_periods_per_window(&self) -> u64 {
        self.slash_window / self.vote_period
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_default_params_are_valid() {
        let params = Params::default();
        assert!(params.validate().is_ok());
        assert_eq!(params.slash_window, 100_800);
        assert_eq!(params.reward_distribution_window, 5_256_000);
        assert_eq!(params.historic_stamp_period, 30);
        assert_eq!(params.median_stamp_period, 1_800);
    }

    #[test]
    fn test_vote_threshold_bounds() {
        assert!(validate_vote_threshold(dec!(0.33)).is_err());
        assert!(validate_vote_threshold(dec!(0.34)).is_ok());
        assert!(validate_vote_threshold(dec!(1)).is_ok());
        assert!(validate_vote_threshold(dec!(1.01)).is_err());
        let err = validate_vote_threshold(dec!(0.505)).unwrap_err();
        assert_eq!(
            err,
            OracleError::InvalidParamValue("threshold precision must be maximum 2 decimals".into())
        );
    }

    #[test]
    fn test_trailing_zeros_do_not_count_as_precision() {
        assert!(validate_vote_threshold(dec!(0.500000)).is_ok());
    }

    #[test]
    fn test_slash_window_must_be_multiple_of_vote_period() {
        let params = Params {
            slash_window: 105,
            ..Params::default()
        };
        assert_eq!(
            params.validate().unwrap_err(),
            invalid("oracle parameter SlashWindow must be an exact multiple of VotePeriod")
        );
    }

    #[test]
    fn test_mandatory_must_be_subset_of_accept() {
        let mut params = Params::default();
        params
            .mandatory_list
            .push(Denom::new("uatom", "ATOM", 6));
        assert_eq!(
            params.validate().unwrap_err(),
            invalid("denom in MandatoryList not present in AcceptList")
        );
    }

    #[test]
    fn test_stamp_periods_ordering() {
        let params = Params {
            historic_stamp_period: 3_600,
            ..Params::default()
        };
        assert!(params.validate().is_err());

        let params = Params {
            historic_stamp_period: 35,
            ..Params::default()
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_unit_interval_params() {
        let params = Params {
            slash_fraction: dec!(-0.1),
            ..Params::default()
        };
        assert_eq!(
            params.validate().unwrap_err(),
            invalid("oracle parameter SlashFraction must be between [0, 1]")
        );
        let params = Params {
            min_valid_per_window: dec!(1.5),
            ..Params::default()
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_param_key_parsing() {
        assert_eq!("VotePeriod".parse::<ParamKey>().unwrap(), ParamKey::VotePeriod);
        assert_eq!(
            "AveragingWindow".parse::<ParamKey>().unwrap(),
            ParamKey::AveragingWindow
        );
        assert_eq!(
            "Bogus".parse::<ParamKey>().unwrap_err().to_string(),
            "Bogus is not an existing oracle param key"
        );
        for key in ParamKey::ALL {
            assert_eq!(key.as_str().parse::<ParamKey>().unwrap(), key);
        }
    }

    #[test]
    fn test_apply_key_normalizes_lists() {
        let mut params = Params::default();
        let mut changes = Params::default();
        changes.accept_list.push(Denom::new("uatom", "atom", 6));
        params.apply_key(ParamKey::AcceptList, &changes);
        assert!(params.accept_list.iter().any(|d| d.symbol_denom == "ATOM"));
        assert_eq!(params.vote_period, DEFAULT_VOTE_PERIOD);
    }
}
