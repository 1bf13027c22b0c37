//! USD to native token conversion priced by moving averages

use super::OracleKeeper;
use crate::domain::{
    decimal, Coin, Decimal, MaType, OracleError, OracleResult, WmaStrategy, CHEQD_DENOM,
    CHEQD_EXPONENT, CHEQD_SYMBOL, USD_DENOM, USD_EXPONENT,
};
use crate::ports::KeyValueStore;

/// Convert an 18-decimal USD amount into ncheq at `price` USD per CHEQ.
pub fn convert_usd_to_ncheq(usd: &Coin, price: Decimal) -> OracleResult<Coin> {
    if usd.denom != USD_DENOM {
        return Err(OracleError::Conversion(format!(
            "expected denom to be 'usd', got: {}",
            usd.denom
        )));
    }
    if price.is_zero() {
        return Err(OracleError::Conversion("cannot convert: price is zero".into()));
    }

    let usd_amount = decimal::checked_div(
        decimal::from_amount(usd.amount)?,
        decimal::pow10(USD_EXPONENT)?,
    )?;
    let cheq = decimal::checked_div(usd_amount, price)?;
    let ncheq = decimal::truncate_to_amount(decimal::checked_mul(cheq, decimal::pow10(CHEQD_EXPONENT)?)?)?;
    if ncheq == 0 {
        return Err(OracleError::Conversion("converted amount is zero".into()));
    }
    Ok(Coin::new(CHEQD_DENOM, ncheq))
}

impl<S: KeyValueStore> OracleKeeper<S> {
    /// Price `amount` (e.g. `"2000000000000000000usd"`) in ncheq through the
    /// selected moving average of CHEQ.
    pub fn convert_usdc_to_cheq(
        &self,
        amount: &str,
        ma_type: &str,
        wma_strategy: &str,
        custom_weights: &[Decimal],
    ) -> OracleResult<Coin> {
        let usd: Coin = amount.parse()?;

        let price = match ma_type.parse::<MaType>()? {
            MaType::Sma => self.sma(CHEQD_SYMBOL)?.ok_or_else(|| {
                OracleError::Conversion(format!("no SMA found for {CHEQD_SYMBOL}"))
            })?,
            MaType::Ema => self.ema(CHEQD_SYMBOL)?.ok_or_else(|| {
                OracleError::Conversion(format!("no EMA found for {CHEQD_SYMBOL}"))
            })?,
            MaType::Wma => match wma_strategy.parse::<WmaStrategy>()? {
                WmaStrategy::Custom => self
                    .custom_wma(CHEQD_SYMBOL, custom_weights)
                    .map_err(|e| {
                        OracleError::Conversion(format!("failed to compute custom WMA: {e}"))
                    })?,
                strategy => self.wma(CHEQD_SYMBOL, strategy)?.ok_or_else(|| {
                    OracleError::Conversion(format!("missing WMA for strategy: {strategy}"))
                })?,
            },
        };

        convert_usd_to_ncheq(&usd, price)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::AverageKind;
    use crate::keeper::test_utils::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_convert_usd_to_ncheq() {
        let usd = Coin::new(USD_DENOM, 2_000_000_000_000_000_000);
        assert_eq!(
            convert_usd_to_ncheq(&usd, dec!(1.0)).unwrap(),
            Coin::new(CHEQD_DENOM, 2_000_000_000)
        );
        assert_eq!(
            convert_usd_to_ncheq(&usd, dec!(0.02)).unwrap(),
            Coin::new(CHEQD_DENOM, 100_000_000_000)
        );
    }

    #[test]
    fn test_convert_errors() {
        let usd = Coin::new(USD_DENOM, 1);
        assert_eq!(
            convert_usd_to_ncheq(&usd, Decimal::ZERO).unwrap_err().to_string(),
            "conversion error: cannot convert: price is zero"
        );
        assert!(convert_usd_to_ncheq(&usd, dec!(1))
            .unwrap_err()
            .to_string()
            .contains("converted amount is zero"));
        assert!(convert_usd_to_ncheq(&Coin::new("eur", 10), dec!(1))
            .unwrap_err()
            .to_string()
            .contains("expected denom to be 'usd', got: eur"));
    }

    #[test]
    fn test_convert_through_moving_averages() {
        let mut f = fixture(&[10]);
        let amount = "2000000000000000000usd";

        assert!(f
            .keeper
            .convert_usdc_to_cheq(amount, "sma", "", &[])
            .unwrap_err()
            .to_string()
            .contains("no SMA found for CHEQ"));

        f.keeper.set_average(AverageKind::Sma, "CHEQ", dec!(2)).unwrap();
        f.keeper
            .set_average(AverageKind::Wma(WmaStrategy::Recent), "CHEQ", dec!(4))
            .unwrap();

        assert_eq!(
            f.keeper.convert_usdc_to_cheq(amount, "sma", "", &[]).unwrap(),
            Coin::new(CHEQD_DENOM, 1_000_000_000)
        );
        assert_eq!(
            f.keeper.convert_usdc_to_cheq(amount, "wma", "RECENT", &[]).unwrap(),
            Coin::new(CHEQD_DENOM, 500_000_000)
        );
        assert!(f
            .keeper
            .convert_usdc_to_cheq(amount, "wma", "OLDEST", &[])
            .unwrap_err()
            .to_string()
            .contains("missing WMA for strategy: OLDEST"));
    }

    #[test]
    fn test_convert_rejects_bad_requests() {
        let f = fixture(&[10]);
        assert!(matches!(
            f.keeper.convert_usdc_to_cheq("2000000000000000000usd", "median", "", &[]),
            Err(OracleError::InvalidRequest(_))
        ));
        assert!(matches!(
            f.keeper.convert_usdc_to_cheq("2000000000000000000usd", "wma", "FASTEST", &[]),
            Err(OracleError::InvalidWmaStrategy(_))
        ));
        assert!(f
            .keeper
            .convert_usdc_to_cheq("usd", "sma", "", &[])
            .unwrap_err()
            .to_string()
            .contains("invalid amount format"));
        assert!(f
            .keeper
            .convert_usdc_to_cheq("2000000000000000000usd", "wma", "CUSTOM", &[dec!(1)])
            .unwrap_err()
            .to_string()
            .contains("failed to compute custom WMA"));
    }
}
