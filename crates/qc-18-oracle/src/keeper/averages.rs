//! Stored moving averages

use super::OracleKeeper;
use crate::domain::{
    average_key, exponential_moving_average, simple_moving_average, weighted_moving_average,
    wma_weights, AverageKind, Decimal, OracleError, OracleResult, WmaStrategy,
};
use crate::ports::KeyValueStore;
use tracing::debug;

impl<S: KeyValueStore> OracleKeeper<S> {
    /// Last `AveragingWindow` historic prices of `symbol`, oldest first.
    fn averaging_samples(&self, symbol: &str) -> OracleResult<Vec<Decimal>> {
        let window = self.params()?.averaging_window;
        let mut samples: Vec<Decimal> = self
            .historic_prices(symbol, window)?
            .into_iter()
            .map(|p| p.exchange_rate)
            .collect();
        samples.reverse();
        Ok(samples)
    }

    /// Recompute and store SMA, EMA and every stored WMA strategy for `symbol`.
    ///
    /// Does nothing while `symbol` has no historic prices.
    pub fn compute_averages(&mut self, symbol: &str) -> OracleResult<()> {
        let samples = self.averaging_samples(symbol)?;
        let Some(sma) = simple_moving_average(&samples)? else {
            return Ok(());
        };
        self.set_average(AverageKind::Sma, symbol, sma)?;

        for strategy in WmaStrategy::STORED {
            let weights = wma_weights(strategy, samples.len(), &[])?;
            let wma = weighted_moving_average(&samples, &weights)?;
            self.set_average(AverageKind::Wma(strategy), symbol, wma)?;
        }

        let window = self.params()?.averaging_window;
        let previous = self.average(AverageKind::Ema, symbol)?;
        if let Some(ema) = exponential_moving_average(previous, &samples, window)? {
            self.set_average(AverageKind::Ema, symbol, ema)?;
        }

        debug!(subsystem = "oracle", denom = %symbol, samples = samples.len(), %sma, "moving averages updated");
        Ok(())
    }

    pub fn average(&self, kind: AverageKind, symbol: &str) -> OracleResult<Option<Decimal>> {
        self.get_value(&average_key(kind, symbol))
    }

    pub fn set_average(&mut self, kind: AverageKind, symbol: &str, value: Decimal) -> OracleResult<()> {
        self.put_value(&average_key(kind, symbol), &value)
    }

    pub fn sma(&self, symbol: &str) -> OracleResult<Option<Decimal>> {
        self.average(AverageKind::Sma, symbol)
    }

    pub fn ema(&self, symbol: &str) -> OracleResult<Option<Decimal>> {
        self.average(AverageKind::Ema, symbol)
    }

    /// Stored WMA for one of the precomputed strategies. `Custom` is never stored.
    pub fn wma(&self, symbol: &str, strategy: WmaStrategy) -> OracleResult<Option<Decimal>> {
        if strategy == WmaStrategy::Custom {
            return Ok(None);
        }
        self.average(AverageKind::Wma(strategy), symbol)
    }

    /// WMA of the live averaging window with caller-supplied weights.
    ///
    /// `weights` must hold exactly `AveragingWindow` entries, oldest first.
    /// While fewer samples exist, the newest weights pair with them.
    pub fn custom_wma(&self, symbol: &str, weights: &[Decimal]) -> OracleResult<Decimal> {
        let window = self.params()?.averaging_window as usize;
        let samples = self.averaging_samples(symbol)?;
        if samples.is_empty() {
            return Err(OracleError::InvalidRequest(format!(
                "no historic prices found for denom: {symbol}"
            )));
        }
        let weights = wma_weights(WmaStrategy::Custom, window, weights)?;
        let aligned = &weights[window - samples.len()..];
        weighted_moving_average(&samples, aligned)
    }
}

#[cfg(test)]
mod tests {
    use crate::domain::{decimal, AverageKind, OracleError, WmaStrategy};
    use crate::keeper::test_utils::*;
    use rust_decimal_macros::dec;

    fn seed(f: &mut Fixture) {
        for (block, rate) in [(30, dec!(1.12)), (60, dec!(1.07)), (90, dec!(1.11))] {
            f.keeper.add_historic_price("CHEQ", block, rate).unwrap();
        }
    }

    #[test]
    fn test_compute_averages() {
        let mut f = fixture(&[10]);
        seed(&mut f);
        f.keeper.compute_averages("CHEQ").unwrap();

        assert_eq!(f.keeper.sma("CHEQ").unwrap(), Some(dec!(1.1)));
        assert_eq!(
            f.keeper.wma("CHEQ", WmaStrategy::Oldest).unwrap(),
            Some(decimal::quantize(dec!(6.61) / dec!(6)))
        );
        assert_eq!(
            f.keeper.wma("CHEQ", WmaStrategy::Balanced).unwrap(),
            Some(dec!(1.0925))
        );
        // alpha 0.5 seeded from 1.12: 1.095, then 1.1025
        assert_eq!(f.keeper.ema("CHEQ").unwrap(), Some(dec!(1.1025)));
    }

    #[test]
    fn test_ema_folds_into_previous_value() {
        let mut f = fixture(&[10]);
        seed(&mut f);
        f.keeper.set_average(AverageKind::Ema, "CHEQ", dec!(1)).unwrap();
        f.keeper.compute_averages("CHEQ").unwrap();
        // 1 -> 1.06 -> 1.065 -> 1.0875
        assert_eq!(f.keeper.ema("CHEQ").unwrap(), Some(dec!(1.0875)));
    }

    #[test]
    fn test_only_latest_window_is_used() {
        let mut f = fixture(&[10]);
        f.keeper.add_historic_price("CHEQ", 0, dec!(100)).unwrap();
        seed(&mut f);
        f.keeper.compute_averages("CHEQ").unwrap();
        assert_eq!(f.keeper.sma("CHEQ").unwrap(), Some(dec!(1.1)));
    }

    #[test]
    fn test_no_prices_stores_nothing() {
        let mut f = fixture(&[10]);
        f.keeper.compute_averages("CHEQ").unwrap();
        assert_eq!(f.keeper.sma("CHEQ").unwrap(), None);
        assert_eq!(f.keeper.ema("CHEQ").unwrap(), None);
    }

    #[test]
    fn test_custom_wma() {
        let mut f = fixture(&[10]);
        assert!(matches!(
            f.keeper.custom_wma("CHEQ", &[dec!(1), dec!(1), dec!(1)]),
            Err(OracleError::InvalidRequest(_))
        ));

        seed(&mut f);
        assert_eq!(
            f.keeper.custom_wma("CHEQ", &[dec!(1), dec!(1), dec!(1)]).unwrap(),
            dec!(1.1)
        );
        assert_eq!(
            f.keeper.custom_wma("CHEQ", &[dec!(1), dec!(2)]).unwrap_err(),
            OracleError::InvalidCustomWeights { expected: 3, actual: 2 }
        );
        assert_eq!(f.keeper.wma("CHEQ", WmaStrategy::Custom).unwrap(), None);
    }
}
