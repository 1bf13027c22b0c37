//! Price feeder supervision
//!
//! The end blocker owns a [`FeederHandle`]. The first enabled end block calls
//! [`FeederHandle::start`], which spawns one background task that runs the
//! feeder's `start` and then serves ticks sent at the end of every vote
//! period. The `started` flag is atomic, so concurrent callers cannot launch
//! the task twice.
//!
//! Block execution never waits on the feeder: ticks are queued with
//! `try_send` and dropped when the queue is full.

use crate::config::FeederConfig;
use crate::domain::{ExchangeRateTuple, Params};
use crate::ports::PriceFeeder;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Ticks buffered while the feeder is busy.
pub const TICK_QUEUE_CAPACITY: usize = 16;

/// Feeder errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FeederError {
    #[error("price feeder already started")]
    AlreadyStarted,

    #[error("price feeder not started")]
    NotStarted,

    #[error("price feeder task has stopped")]
    ChannelClosed,

    #[error("price feeder tick queue is full")]
    ChannelFull,

    #[error("price feeder tick timed out after {0:?}")]
    Timeout(Duration),

    #[error("price feeder error: {0}")]
    Source(String),
}

#[derive(Debug)]
struct Tick {
    height: u64,
    params: Params,
}

/// Owned handle to the background price-feeder task.
pub struct FeederHandle {
    feeder: Arc<dyn PriceFeeder>,
    config: FeederConfig,
    runtime: Handle,
    started: AtomicBool,
    task: Mutex<Option<JoinHandle<()>>>,
    ticks: Mutex<Option<mpsc::Sender<Tick>>>,
}

impl FeederHandle {
    pub fn new(feeder: Arc<dyn PriceFeeder>, config: FeederConfig, runtime: Handle) -> Self {
        Self {
            feeder,
            config,
            runtime,
            started: AtomicBool::new(false),
            task: Mutex::new(None),
            ticks: Mutex::new(None),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enable
    }

    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::SeqCst)
    }

    /// Spawn the feeder task. Only the first call after construction (or
    /// after a stop) succeeds.
    pub fn start(&self, height: u64, params: &Params) -> Result<(), FeederError> {
        if self
            .started
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(FeederError::AlreadyStarted);
        }

        let (tx, mut rx) = mpsc::channel::<Tick>(TICK_QUEUE_CAPACITY);
        let feeder = self.feeder.clone();
        let params = params.clone();
        let tick_timeout = self.config.tick_timeout;

        let task = self.runtime.spawn(async move {
            if let Err(e) = feeder.start(height, &params).await {
                error!(subsystem = "oracle", height, error = %e, "error starting price feeder");
                return;
            }
            info!(subsystem = "oracle", height, "price feeder started");

            while let Some(tick) = rx.recv().await {
                match tokio::time::timeout(tick_timeout, feeder.tick(tick.height, &tick.params))
                    .await
                {
                    Ok(Ok(())) => debug!(subsystem = "oracle", height = tick.height, "price feeder tick"),
                    Ok(Err(e)) => warn!(
                        subsystem = "oracle",
                        height = tick.height,
                        error = %e,
                        "error in price feeder tick"
                    ),
                    Err(_) => warn!(
                        subsystem = "oracle",
                        height = tick.height,
                        error = %FeederError::Timeout(tick_timeout),
                        "price feeder tick abandoned"
                    ),
                }
            }

            info!(subsystem = "oracle", "price feeder task stopped");
        });

        *self.ticks.lock() = Some(tx);
        *self.task.lock() = Some(task);
        Ok(())
    }

    /// Queue a tick for the feeder without blocking.
    pub fn tick(&self, height: u64, params: &Params) -> Result<(), FeederError> {
        let guard = self.ticks.lock();
        let sender = guard.as_ref().ok_or(FeederError::NotStarted)?;
        sender
            .try_send(Tick {
                height,
                params: params.clone(),
            })
            .map_err(|e| match e {
                mpsc::error::TrySendError::Full(_) => FeederError::ChannelFull,
                mpsc::error::TrySendError::Closed(_) => FeederError::ChannelClosed,
            })
    }

    /// Close the tick queue and wait for the task to drain it.
    pub async fn stop(&self) -> Result<(), FeederError> {
        let sender = self.ticks.lock().take();
        if sender.is_none() {
            return Err(FeederError::NotStarted);
        }
        drop(sender);

        let task = self.task.lock().take();
        if let Some(task) = task {
            if let Err(e) = task.await {
                if !e.is_cancelled() {
                    self.started.store(false, Ordering::SeqCst);
                    return Err(FeederError::Source(e.to_string()));
                }
            }
        }
        self.started.store(false, Ordering::SeqCst);
        info!(subsystem = "oracle", "price feeder stopped");
        Ok(())
    }

    /// Abort the task immediately, dropping queued ticks.
    pub fn cancel(&self) {
        self.ticks.lock().take();
        if let Some(task) = self.task.lock().take() {
            task.abort();
            info!(subsystem = "oracle", "price feeder task aborted");
        }
        self.started.store(false, Ordering::SeqCst);
    }

    /// Latest feeder prices; empty until the feeder has produced any.
    pub fn prices(&self) -> Vec<ExchangeRateTuple> {
        self.feeder.prices()
    }
}

impl Drop for FeederHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.get_mut().take() {
            task.abort();
        }
    }
}
