//! Historic prices, medians and median deviations
//!
//! All three series share the `(denom, block)` key layout, so the newest
//! stamps of a denom are a reverse page over its denom prefix.

use super::OracleKeeper;
use crate::domain::{
    last_historic_block_key, stats, Decimal, OracleError, OracleResult, PriceKey, PriceStamp,
    PREFIX_HISTORIC_PRICE, PREFIX_MEDIAN, PREFIX_MEDIAN_DEVIATION,
};
use crate::ports::{KeyValueStore, PageRequest};
use tracing::debug;

impl<S: KeyValueStore> OracleKeeper<S> {
    /// Last `limit` stamps of `denom` under `prefix`, newest first. Zero means all.
    fn latest_stamps(&self, prefix: u8, denom: &str, limit: u64) -> OracleResult<Vec<PriceStamp>> {
        let denom_prefix = PriceKey::denom_prefix(prefix, denom)?;
        let page = self
            .store()
            .paged_scan(&denom_prefix, PageRequest::reverse(limit as usize))?;
        page.entries
            .into_iter()
            .map(|(k, v)| {
                let key = PriceKey::decode(&k)?;
                let rate: Decimal = super::decode(&k, &v)?;
                Ok(PriceStamp::new(key.denom, key.block, rate))
            })
            .collect()
    }

    /// Every stamp under `prefix`, ordered by denom then block.
    fn all_stamps(&self, prefix: u8) -> OracleResult<Vec<PriceStamp>> {
        self.scan_values::<Decimal>(&[prefix])?
            .into_iter()
            .map(|(k, rate)| {
                let key = PriceKey::decode(&k)?;
                Ok(PriceStamp::new(key.denom, key.block, rate))
            })
            .collect()
    }

    fn put_stamp(&mut self, prefix: u8, denom: &str, block: u64, rate: Decimal) -> OracleResult<()> {
        let key = PriceKey::new(denom, block).encode(prefix)?;
        self.put_value(&key, &rate)
    }

    fn prune_stamps(&mut self, prefix: u8, cutoff: u64) -> OracleResult<usize> {
        let mut pruned = 0;
        for (key, _) in self.store().prefix_scan(&[prefix])? {
            if PriceKey::decode(&key)?.block <= cutoff {
                self.delete_key(&key)?;
                pruned += 1;
            }
        }
        Ok(pruned)
    }

    // === PRICES ===

    /// Record `rate` for `denom` at `block` and remember it as the latest stamp.
    pub fn add_historic_price(&mut self, denom: &str, block: u64, rate: Decimal) -> OracleResult<()> {
        self.put_stamp(PREFIX_HISTORIC_PRICE, denom, block, rate)?;
        self.put_value(&last_historic_block_key(denom), &block)
    }

    /// Block of the most recent historic price of `denom`.
    pub fn last_historic_block(&self, denom: &str) -> OracleResult<Option<u64>> {
        self.get_value(&last_historic_block_key(denom))
    }

    pub fn delete_historic_price(&mut self, denom: &str, block: u64) -> OracleResult<()> {
        self.delete_key(&PriceKey::new(denom, block).encode(PREFIX_HISTORIC_PRICE)?)
    }

    /// Last `num_stamps` prices of `denom`, newest first.
    pub fn historic_prices(&self, denom: &str, num_stamps: u64) -> OracleResult<Vec<PriceStamp>> {
        self.latest_stamps(PREFIX_HISTORIC_PRICE, denom, num_stamps)
    }

    pub fn all_historic_prices(&self) -> OracleResult<Vec<PriceStamp>> {
        self.all_stamps(PREFIX_HISTORIC_PRICE)
    }

    // === MEDIANS ===

    /// Median and deviation of the retained prices of `denom`, stamped at `height`.
    pub fn calc_and_set_historic_median(&mut self, denom: &str, height: u64) -> OracleResult<()> {
        let params = self.params()?;
        let prices: Vec<Decimal> = self
            .historic_prices(denom, params.maximum_price_stamps)?
            .into_iter()
            .map(|p| p.exchange_rate)
            .collect();

        let median = stats::median(&prices).map_err(|e| with_denom(e, denom))?;
        self.set_historic_median(denom, height, median)?;

        let deviation = stats::median_deviation(median, &prices).map_err(|e| with_denom(e, denom))?;
        self.set_historic_median_deviation(denom, height, deviation)?;

        debug!(subsystem = "oracle", %denom, height, %median, %deviation, "historic median stamped");
        Ok(())
    }

    pub fn set_historic_median(&mut self, denom: &str, block: u64, median: Decimal) -> OracleResult<()> {
        self.put_stamp(PREFIX_MEDIAN, denom, block, median)
    }

    pub fn delete_historic_median(&mut self, denom: &str, block: u64) -> OracleResult<()> {
        self.delete_key(&PriceKey::new(denom, block).encode(PREFIX_MEDIAN)?)
    }

    /// Last `num_stamps` medians of `denom`, newest first.
    pub fn historic_medians(&self, denom: &str, num_stamps: u64) -> OracleResult<Vec<PriceStamp>> {
        self.latest_stamps(PREFIX_MEDIAN, denom, num_stamps)
    }

    pub fn all_median_prices(&self) -> OracleResult<Vec<PriceStamp>> {
        self.all_stamps(PREFIX_MEDIAN)
    }

    pub fn median_of_historic_medians(&self, denom: &str, num_stamps: u64) -> OracleResult<(Decimal, u32)> {
        self.reduce_medians(denom, num_stamps, stats::median)
    }

    pub fn average_of_historic_medians(&self, denom: &str, num_stamps: u64) -> OracleResult<(Decimal, u32)> {
        self.reduce_medians(denom, num_stamps, stats::average)
    }

    pub fn max_of_historic_medians(&self, denom: &str, num_stamps: u64) -> OracleResult<(Decimal, u32)> {
        self.reduce_medians(denom, num_stamps, stats::max)
    }

    pub fn min_of_historic_medians(&self, denom: &str, num_stamps: u64) -> OracleResult<(Decimal, u32)> {
        self.reduce_medians(denom, num_stamps, stats::min)
    }

    /// Apply `reduce` to the last `num_stamps` medians.
    ///
    /// Returns the value and the number of medians used; `(0, 0)` when there are none.
    fn reduce_medians(
        &self,
        denom: &str,
        num_stamps: u64,
        reduce: fn(&[Decimal]) -> OracleResult<Decimal>,
    ) -> OracleResult<(Decimal, u32)> {
        let medians: Vec<Decimal> = self
            .historic_medians(denom, num_stamps)?
            .into_iter()
            .map(|m| m.exchange_rate)
            .collect();
        if medians.is_empty() {
            return Ok((Decimal::ZERO, 0));
        }
        let value = reduce(&medians).map_err(|e| with_denom(e, denom))?;
        let count = u32::try_from(medians.len())
            .map_err(|_| OracleError::Arithmetic("median count exceeds u32".into()))?;
        Ok((value, count))
    }

    // === DEVIATIONS ===

    pub fn set_historic_median_deviation(
        &mut self,
        denom: &str,
        block: u64,
        deviation: Decimal,
    ) -> OracleResult<()> {
        self.put_stamp(PREFIX_MEDIAN_DEVIATION, denom, block, deviation)
    }

    pub fn delete_historic_median_deviation(&mut self, denom: &str, block: u64) -> OracleResult<()> {
        self.delete_key(&PriceKey::new(denom, block).encode(PREFIX_MEDIAN_DEVIATION)?)
    }

    /// Last `num_stamps` deviations of `denom`, newest first.
    pub fn historic_deviations(&self, denom: &str, num_stamps: u64) -> OracleResult<Vec<PriceStamp>> {
        self.latest_stamps(PREFIX_MEDIAN_DEVIATION, denom, num_stamps)
    }

    pub fn all_median_deviation_prices(&self) -> OracleResult<Vec<PriceStamp>> {
        self.all_stamps(PREFIX_MEDIAN_DEVIATION)
    }

    /// Deviation stamped at the last median boundary before `height`.
    pub fn historic_median_deviation(&self, denom: &str, height: u64) -> OracleResult<PriceStamp> {
        let period = self.params()?.median_stamp_period;
        let no_deviation = || OracleError::NoMedianDeviation {
            denom: denom.to_string(),
        };
        if period == 0 {
            return Err(no_deviation());
        }
        let block = height
            .checked_sub(height % period + 1)
            .ok_or_else(no_deviation)?;
        let key = PriceKey::new(denom, block).encode(PREFIX_MEDIAN_DEVIATION)?;
        let deviation: Decimal = self.get_value(&key)?.ok_or_else(no_deviation)?;
        Ok(PriceStamp::new(denom, block, deviation))
    }

    /// Whether the latest price of `denom` sits within the stamped deviation of the latest median.
    pub fn within_historic_median_deviation(&self, denom: &str, height: u64) -> OracleResult<bool> {
        let median = self
            .historic_medians(denom, 1)?
            .into_iter()
            .next()
            .ok_or_else(|| OracleError::NoMedian {
                denom: denom.to_string(),
            })?;
        let price = self
            .historic_prices(denom, 1)?
            .into_iter()
            .next()
            .ok_or_else(|| OracleError::NoHistoricPrice {
                denom: denom.to_string(),
            })?;
        let deviation = self.historic_median_deviation(denom, height)?;

        let distance = (price.exchange_rate - median.exchange_rate).abs();
        Ok(distance <= deviation.exchange_rate)
    }

    // === PRUNING ===

    /// Drop prices older than the price retention window and medians and
    /// deviations older than the median retention window.
    pub fn prune_all_prices(&mut self, height: u64) -> OracleResult<()> {
        let params = self.params()?;

        let price_window = params
            .maximum_price_stamps
            .saturating_mul(params.historic_stamp_period);
        if height > price_window {
            let pruned = self.prune_stamps(PREFIX_HISTORIC_PRICE, height - price_window)?;
            if pruned > 0 {
                debug!(subsystem = "oracle", height, pruned, "pruned historic prices");
            }
        }

        let median_window = params
            .maximum_median_stamps
            .saturating_mul(params.median_stamp_period);
        if height > median_window {
            let cutoff = height - median_window;
            self.prune_stamps(PREFIX_MEDIAN, cutoff)?;
            self.prune_stamps(PREFIX_MEDIAN_DEVIATION, cutoff)?;
        }
        Ok(())
    }
}

fn with_denom(err: OracleError, denom: &str) -> OracleError {
    match err {
        OracleError::EmptyList(msg) => OracleError::EmptyList(format!("{msg}: denom: {denom}")),
        other => other,
    }
}
