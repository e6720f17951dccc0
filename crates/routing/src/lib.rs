//! Route tagged messages from a request chat to its collection chat.
//!
//! A message is forwarded only when:
//! 1. its chat has a complete link record
//! 2. it carries text (or a photo caption)
//! 3. the text contains the tag marker, in any letter case

pub mod error;
pub mod relay;
pub mod tag;

pub use {
    error::{Error, Result},
    relay::{IgnoreReason, InboundMessage, RelayOutcome, RequestRelay},
    tag::{DEFAULT_TAG, TagMarker, format_request},
};
