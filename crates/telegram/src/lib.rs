//! Telegram adapter for courier.
//!
//! Long-polls the Bot API with teloxide, turns updates into pairing
//! commands, auto-claims and relay candidates, and implements the
//! platform ports from `courier-channels`.

pub mod access;
pub mod bot;
pub mod commands;
pub mod error;
pub mod handlers;
pub mod outbound;
pub mod state;

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod mock_api;

pub use {
    access::TelegramAdmins,
    bot::start_polling,
    error::{Error, Result},
    outbound::TelegramOutbound,
    state::BotContext,
};
