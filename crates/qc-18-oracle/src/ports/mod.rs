//! Ports layer (Hexagonal Architecture)
//!
//! The oracle only drives collaborators; inbound traffic arrives through
//! [`crate::service`] and [`crate::abci`].

mod outbound;

pub use outbound::*;
