//! Asset denominations, reward bands and feeder pair configuration

use super::decimal::Decimal;
use super::error::{OracleError, OracleResult};
use serde::{Deserialize, Serialize};

pub const CHEQD_DENOM: &str = "ncheq";
pub const CHEQD_SYMBOL: &str = "CHEQ";
pub const CHEQD_EXPONENT: u32 = 9;
pub const USDT_DENOM: &str =
    "ibc/C4CFF46FD6DE35CA4CF4CE031E643C8FDC9BA4B99AE598E9B0ED98FE3A2319F9";
pub const USDT_SYMBOL: &str = "USDT";
pub const USDT_EXPONENT: u32 = 18;
pub const USDC_DENOM: &str =
    "ibc/F5FABF52B54E65064B57BF6DBD8E5FAD22CEE9F4B8A57ADBB20CCD0173AA72A4";
pub const USDC_SYMBOL: &str = "USDC";
pub const USDC_EXPONENT: u32 = 6;
pub const USD_SYMBOL: &str = "USD";
/// Denom of USD amounts priced through the oracle, 18 decimals.
pub const USD_DENOM: &str = "usd";
pub const USD_EXPONENT: u32 = 18;

/// A tradable asset: on-chain base denom plus its ticker symbol.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Denom {
    pub base_denom: String,
    pub symbol_denom: String,
    pub exponent: u32,
}

impl Denom {
    pub fn new(base_denom: impl Into<String>, symbol_denom: impl Into<String>, exponent: u32) -> Self {
        Self {
            base_denom: base_denom.into(),
            symbol_denom: symbol_denom.into(),
            exponent,
        }
    }
}

/// Ordered list of denoms. Membership is decided by symbol, case-insensitively.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DenomList(pub Vec<Denom>);

impl DenomList {
    pub fn iter(&self) -> std::slice::Iter<'_, Denom> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn push(&mut self, denom: Denom) {
        self.0.push(denom);
    }

    /// Whether a denom with this symbol is listed.
    pub fn contains(&self, symbol: &str) -> bool {
        self.0
            .iter()
            .any(|d| d.symbol_denom.eq_ignore_ascii_case(symbol))
    }

    /// Whether every denom of `other` is listed.
    pub fn contain_denoms(&self, other: &DenomList) -> bool {
        other.iter().all(|d| self.contains(&d.symbol_denom))
    }

    pub fn find_by_symbol(&self, symbol: &str) -> Option<&Denom> {
        self.0
            .iter()
            .find(|d| d.symbol_denom.eq_ignore_ascii_case(symbol))
    }

    pub fn find_by_base(&self, base: &str) -> Option<&Denom> {
        self.0.iter().find(|d| d.base_denom == base)
    }

    /// Uppercase every symbol.
    pub fn normalize(&self) -> DenomList {
        DenomList(
            self.0
                .iter()
                .map(|d| Denom {
                    symbol_denom: d.symbol_denom.to_uppercase(),
                    ..d.clone()
                })
                .collect(),
        )
    }
}

impl FromIterator<Denom> for DenomList {
    fn from_iter<I: IntoIterator<Item = Denom>>(iter: I) -> Self {
        DenomList(iter.into_iter().collect())
    }
}

/// Maximum tolerated spread around the median, as a fraction of it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardBand {
    pub symbol_denom: String,
    pub reward_band: Decimal,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardBandList(pub Vec<RewardBand>);

impl RewardBandList {
    pub fn iter(&self) -> std::slice::Iter<'_, RewardBand> {
        self.0.iter()
    }

    pub fn add(&mut self, symbol: impl Into<String>, band: Decimal) {
        self.0.push(RewardBand {
            symbol_denom: symbol.into(),
            reward_band: band,
        });
    }

    pub fn add_default(&mut self, symbol: impl Into<String>) {
        self.add(symbol, default_reward_band());
    }

    pub fn band_for(&self, symbol: &str) -> OracleResult<Decimal> {
        self.0
            .iter()
            .find(|b| b.symbol_denom.eq_ignore_ascii_case(symbol))
            .map(|b| b.reward_band)
            .ok_or_else(|| OracleError::NoRewardBand(symbol.to_string()))
    }
}

/// 0.02
pub fn default_reward_band() -> Decimal {
    Decimal::new(2, 2)
}

/// Which market-data providers the off-chain feeder queries for a pair.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencyPairProviders {
    pub base_denom: String,
    pub quote_denom: String,
    #[serde(default)]
    pub pair_address: Vec<PairAddressProvider>,
    pub providers: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairAddressProvider {
    pub address: String,
    pub address_provider: String,
}

impl CurrencyPairProviders {
    pub fn new(base: &str, quote: &str, providers: &[&str]) -> Self {
        Self {
            base_denom: base.to_string(),
            quote_denom: quote.to_string(),
            pair_address: Vec::new(),
            providers: providers.iter().map(|p| p.to_string()).collect(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencyPairProvidersList(pub Vec<CurrencyPairProviders>);

impl CurrencyPairProvidersList {
    pub fn iter(&self) -> std::slice::Iter<'_, CurrencyPairProviders> {
        self.0.iter()
    }

    /// Drop every entry whose base and quote match `pair` exactly.
    pub fn remove_pair(mut self, pair: &CurrencyPairProviders) -> Self {
        self.0
            .retain(|p| !(p.base_denom == pair.base_denom && p.quote_denom == pair.quote_denom));
        self
    }
}

/// Maximum deviation the feeder tolerates between providers for a base denom.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencyDeviationThreshold {
    pub base_denom: String,
    pub threshold: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencyDeviationThresholdList(pub Vec<CurrencyDeviationThreshold>);

impl CurrencyDeviationThresholdList {
    pub fn iter(&self) -> std::slice::Iter<'_, CurrencyDeviationThreshold> {
        self.0.iter()
    }

    pub fn remove_base(mut self, base_denom: &str) -> Self {
        self.0.retain(|t| !t.base_denom.eq_ignore_ascii_case(base_denom));
        self
    }
}

/// Convert a symbol rate into a rate per base unit: `rate / 10^exponent`.
pub fn rate_per_base_unit(rate: Decimal, exponent: u32) -> OracleResult<Decimal> {
    let scale = super::decimal::pow10(exponent)?;
    super::decimal::checked_div(rate, scale)
}
