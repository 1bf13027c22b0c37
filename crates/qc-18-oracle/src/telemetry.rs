//! Tracing subscriber setup.
//!
//! Installs a `tracing-subscriber` registry with an `EnvFilter` and either a
//! JSON layer (containers) or a pretty `fmt` layer (development).

use crate::config::OracleConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Telemetry errors
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    #[error("Invalid log filter: {0}")]
    Filter(String),

    #[error("Failed to install tracing subscriber: {0}")]
    Init(String),
}

/// Filter from `RUST_LOG`, falling back to the configured level.
pub fn env_filter(config: &OracleConfig) -> Result<EnvFilter, TelemetryError> {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .map_err(|e| TelemetryError::Filter(e.to_string()))
}

/// Install the global subscriber.
///
/// Fails, without panicking, when a global subscriber is already set.
pub fn init_tracing(config: &OracleConfig) -> Result<(), TelemetryError> {
    let filter = env_filter(config)?;

    if config.json_logs {
        let json_layer = tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true);

        tracing_subscriber::registry()
            .with(filter)
            .with(json_layer)
            .try_init()
            .map_err(|e| TelemetryError::Init(e.to_string()))?;
    } else {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .with_ansi(true);

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .try_init()
            .map_err(|e| TelemetryError::Init(e.to_string()))?;
    }

    tracing::info!(
        subsystem = "oracle",
        chain_id = %config.chain_id,
        json_logs = config.json_logs,
        "oracle tracing initialized"
    );
    Ok(())
}
