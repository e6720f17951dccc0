//! Platform-neutral chat types and the narrow ports the core talks through.
//!
//! The pairing, store and relay crates never see a platform SDK; adapters
//! (Telegram today) implement [`ChatOutbound`] and [`AdminDirectory`].

pub mod error;
pub mod format;
pub mod outbound;
pub mod types;

pub use {
    error::{Error, Result},
    outbound::{AdminDirectory, ChatOutbound, SendOutcome, TextFormat},
    types::{ChatRef, UserId},
};
