//! Static price feeder
//!
//! Implements the PriceFeeder port with prices set by the caller. Used by
//! tests and by nodes that receive prices from an external process.

use crate::domain::{ExchangeRateTuple, Params};
use crate::feeder::FeederError;
use crate::ports::PriceFeeder;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Default)]
pub struct StaticPriceFeeder {
    prices: RwLock<Vec<ExchangeRateTuple>>,
    starts: AtomicU64,
    ticks: AtomicU64,
    last_tick_height: AtomicU64,
    fail_start: RwLock<Option<String>>,
}

impl StaticPriceFeeder {
    pub fn new(prices: Vec<ExchangeRateTuple>) -> Self {
        Self {
            prices: RwLock::new(prices),
            ..Self::default()
        }
    }

    pub fn set_prices(&self, prices: Vec<ExchangeRateTuple>) {
        *self.prices.write() = prices;
    }

    /// Make the next `start` call fail with `message`.
    pub fn fail_next_start(&self, message: impl Into<String>) {
        *self.fail_start.write() = Some(message.into());
    }

    pub fn start_count(&self) -> u64 {
        self.starts.load(Ordering::SeqCst)
    }

    pub fn tick_count(&self) -> u64 {
        self.ticks.load(Ordering::SeqCst)
    }

    pub fn last_tick_height(&self) -> u64 {
        self.last_tick_height.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PriceFeeder for StaticPriceFeeder {
    async fn start(&self, _height: u64, _params: &Params) -> Result<(), FeederError> {
        if let Some(message) = self.fail_start.write().take() {
            return Err(FeederError::Source(message));
        }
        self.starts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn tick(&self, height: u64, _params: &Params) -> Result<(), FeederError> {
        self.ticks.fetch_add(1, Ordering::SeqCst);
        self.last_tick_height.store(height, Ordering::SeqCst);
        Ok(())
    }

    fn prices(&self) -> Vec<ExchangeRateTuple> {
        self.prices.read().clone()
    }
}
