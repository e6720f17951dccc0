//! Two-step link handshake between a request chat and a collection chat.
//!
//! An admin runs the request command in one chat and the collect command in
//! another, in either order. The first half is parked in a
//! [`PairingSessions`] store keyed by user; the second half completes the
//! link through the [`LinkManager`], which also notifies the oversight group.

pub mod coordinator;
pub mod error;
pub mod lifecycle;
pub mod session;

pub use {
    coordinator::{PairingCoordinator, PairingOutcome, UnlinkOutcome},
    error::{Error, Result},
    lifecycle::{LinkEvent, LinkManager},
    session::{
        DEFAULT_PAIRING_TTL, MemorySessions, PairingSessions, PendingEntry, PendingHalf, Role,
    },
};
