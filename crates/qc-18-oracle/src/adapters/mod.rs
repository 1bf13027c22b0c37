//! Adapters layer (Hexagonal Architecture)
//!
//! In-process implementations of every outbound port.

mod bank;
mod event_bus;
mod memory_store;
mod price_feeder;
mod signature;
mod staking;

pub use bank::*;
pub use event_bus::*;
pub use memory_store::*;
pub use price_feeder::*;
pub use signature::*;
pub use staking::*;
