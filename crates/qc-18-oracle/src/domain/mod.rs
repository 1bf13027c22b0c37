//! Domain layer for the Oracle subsystem
//!
//! Pure types and math. Nothing here touches the store or a collaborator.
//!
//! - address: operator, account and consensus addresses
//! - ballot: weighted median, deviation, claims
//! - averages: SMA / EMA / WMA
//! - stats: medians and deviations of historic prices
//! - keys: store key layout, including the ordered `(denom, block)` key

mod address;
mod averages;
mod ballot;
mod coin;
pub mod decimal;
mod denom;
mod error;
mod keys;
mod msgs;
mod params;
mod plan;
pub mod stats;
mod vote;

pub use address::*;
pub use averages::*;
pub use ballot::*;
pub use coin::*;
pub use decimal::Decimal;
pub use denom::*;
pub use error::*;
pub use keys::*;
pub use msgs::*;
pub use params::*;
pub use plan::*;
pub use stats::{sort_stamps, PriceStamp};
pub use vote::*;
